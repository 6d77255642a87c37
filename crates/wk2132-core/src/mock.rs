//! Scripted bus for unit tests
//!
//! Records every transaction and answers reads from a queue of canned
//! responses. An empty queue yields a zero-length read.

extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use crate::bus::I2cMaster;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Write { addr: u8, data: Vec<u8> },
    Read { addr: u8, len: usize },
}

impl Op {
    pub fn write(addr: u8, data: &[u8]) -> Self {
        Op::Write {
            addr,
            data: data.to_vec(),
        }
    }

    pub fn read(addr: u8, len: usize) -> Self {
        Op::Read { addr, len }
    }
}

#[derive(Debug)]
enum Response {
    Data(Vec<u8>),
    Fail,
}

#[derive(Debug)]
pub struct MockBus {
    pub ops: Vec<Op>,
    pub max_len: usize,
    responses: VecDeque<Response>,
    fail_write_at: Option<usize>,
    writes_seen: usize,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            max_len: 32,
            responses: VecDeque::new(),
            fail_write_at: None,
            writes_seen: 0,
        }
    }

    /// Queue the payload of the next read
    pub fn respond(&mut self, data: &[u8]) -> &mut Self {
        self.responses.push_back(Response::Data(data.to_vec()));
        self
    }

    /// Make the next read fail
    pub fn fail_read(&mut self) -> &mut Self {
        self.responses.push_back(Response::Fail);
        self
    }

    /// Make the n-th write from now (0-based) fail
    pub fn fail_write(&mut self, n: usize) -> &mut Self {
        self.fail_write_at = Some(self.writes_seen + n);
        self
    }

    pub fn reads(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, Op::Read { .. }))
            .count()
    }

    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Write { addr, data } => Some((*addr, data.clone())),
                _ => None,
            })
            .collect()
    }
}

impl I2cMaster for MockBus {
    fn max_transfer_len(&self) -> usize {
        self.max_len
    }

    fn write(&mut self, address: u8, data: &[u8]) -> Result<()> {
        self.ops.push(Op::write(address, data));
        let index = self.writes_seen;
        self.writes_seen += 1;
        if self.fail_write_at == Some(index) {
            return Err(Error::Bus);
        }
        Ok(())
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize> {
        self.ops.push(Op::read(address, buf.len()));
        match self.responses.pop_front() {
            Some(Response::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            Some(Response::Fail) => Err(Error::Bus),
            None => Ok(0),
        }
    }
}
