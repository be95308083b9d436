// Crossfill – A crossword autofill engine
// Copyright (C) 2024  Neil Roberts
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Directed acyclic word graphs over words of a single length.
//!
//! The encoded form is a list of nodes in breadth-first order starting
//! with the root. It begins with the node count and then each node is
//! written as:
//!
//! * a varint holding `edge_count << 1 | terminal`
//! * for each edge, in increasing letter order, the UTF-8 encoding of
//!   the letter followed by a varint with the index of the target node.
//!
//! Varints are little-endian groups of 7 bits where the top bit of
//! each byte is set if more bytes follow. Every edge points to a node
//! with a higher index than its source so the graph can be validated
//! in a single pass.

use std::fmt;
use std::collections::VecDeque;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rustc_hash::FxHashMap;
use super::word_index::{self, IndexError};

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DecodeError {
    InvalidBase64,
    Truncated,
    InvalidLetter,
    UnsortedEdges,
    BadTarget,
    Unreachable,
    DepthMismatch,
    DeadEnd,
    TrailingData,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::InvalidBase64 => write!(f, "invalid base64 data"),
            DecodeError::Truncated => write!(f, "word graph is truncated"),
            DecodeError::InvalidLetter => write!(f, "invalid UTF-8 letter"),
            DecodeError::UnsortedEdges => write!(f, "edges are not sorted"),
            DecodeError::BadTarget => write!(f, "edge target out of range"),
            DecodeError::Unreachable => write!(f, "unreachable node"),
            DecodeError::DepthMismatch => {
                write!(f, "path length doesn’t match the word length")
            },
            DecodeError::DeadEnd => write!(f, "node leads to no words"),
            DecodeError::TrailingData => {
                write!(f, "unexpected data after the last node")
            },
        }
    }
}

impl std::error::Error for DecodeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeRecord {
    terminal: bool,
    first_edge: u32,
    edge_count: u32,
}

/// A frozen, minimized word graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dawg {
    cardinality: usize,
    nodes: Vec<NodeRecord>,
    edges: Vec<(char, u32)>,
}

pub const ROOT: u32 = 0;

impl Dawg {
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self, node: u32) -> &[(char, u32)] {
        let record = &self.nodes[node as usize];
        let start = record.first_edge as usize;

        &self.edges[start..start + record.edge_count as usize]
    }

    pub fn is_terminal(&self, node: u32) -> bool {
        self.nodes[node as usize].terminal
    }

    pub fn step(&self, node: u32, letter: char) -> Option<u32> {
        let edges = self.edges(node);

        edges.binary_search_by_key(&letter, |&(ch, _)| ch)
            .ok()
            .map(|pos| edges[pos].1)
    }

    pub fn contains(&self, word: &str) -> bool {
        word.chars()
            .try_fold(ROOT, |node, letter| self.step(node, letter))
            .is_some_and(|node| self.is_terminal(node))
    }

    /// Every word accepted by the graph in lexicographic order.
    pub fn words(&self) -> Vec<String> {
        let mut words = Vec::new();
        let mut stack = vec![(ROOT, String::new())];

        while let Some((node, prefix)) = stack.pop() {
            if self.is_terminal(node) {
                words.push(prefix.clone());
            }

            for &(letter, child) in self.edges(node).iter().rev() {
                let mut word = prefix.clone();
                word.push(letter);
                stack.push((child, word));
            }
        }

        words
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::new();

        write_varint(&mut data, self.nodes.len());

        let mut utf8 = [0u8; 4];

        for (index, record) in self.nodes.iter().enumerate() {
            write_varint(
                &mut data,
                ((record.edge_count as usize) << 1) | record.terminal as usize,
            );

            for &(letter, target) in self.edges(index as u32) {
                data.extend_from_slice(letter.encode_utf8(&mut utf8).as_bytes());
                write_varint(&mut data, target as usize);
            }
        }

        data
    }

    pub fn encode_base64(&self) -> String {
        BASE64.encode(self.encode())
    }

    pub fn decode(cardinality: usize, data: &[u8]) -> Result<Dawg, DecodeError> {
        let (mut data, node_count) = read_varint(data)
            .ok_or(DecodeError::Truncated)?;

        if node_count < 1 {
            return Err(DecodeError::Truncated);
        }

        // Every node takes at least one byte so this stops a bogus
        // count from reserving a huge buffer
        let mut nodes = Vec::with_capacity(node_count.min(data.len() + 1));
        let mut edges = Vec::new();

        for index in 0..node_count {
            let (remainder, header) = read_varint(data)
                .ok_or(DecodeError::Truncated)?;
            data = remainder;

            let edge_count = header >> 1;
            let first_edge = edges.len();
            let mut last_letter = None;

            for _ in 0..edge_count {
                let (remainder, letter) = read_letter(data)?;
                let (remainder, target) = read_varint(remainder)
                    .ok_or(DecodeError::Truncated)?;
                data = remainder;

                if last_letter.is_some_and(|last| last >= letter) {
                    return Err(DecodeError::UnsortedEdges);
                }

                if target <= index || target >= node_count {
                    return Err(DecodeError::BadTarget);
                }

                last_letter = Some(letter);
                edges.push((letter, target as u32));
            }

            nodes.push(NodeRecord {
                terminal: header & 1 != 0,
                first_edge: first_edge as u32,
                edge_count: edge_count as u32,
            });
        }

        if !data.is_empty() {
            return Err(DecodeError::TrailingData);
        }

        let dawg = Dawg { cardinality, nodes, edges };

        dawg.validate_depths()?;

        Ok(dawg)
    }

    pub fn decode_base64(
        cardinality: usize,
        payload: &str,
    ) -> Result<Dawg, DecodeError> {
        let data = BASE64.decode(payload.trim())
            .map_err(|_| DecodeError::InvalidBase64)?;

        Dawg::decode(cardinality, &data)
    }

    // Edges always point forwards so the depth of every node is known
    // before it is visited.
    fn validate_depths(&self) -> Result<(), DecodeError> {
        let mut depths = vec![None; self.nodes.len()];
        depths[ROOT as usize] = Some(0);

        for (index, record) in self.nodes.iter().enumerate() {
            let Some(depth) = depths[index]
            else {
                return Err(DecodeError::Unreachable);
            };

            if depth == self.cardinality {
                if record.edge_count > 0 {
                    return Err(DecodeError::DepthMismatch);
                }
            } else if record.terminal {
                return Err(DecodeError::DepthMismatch);
            }

            // Only the root of an empty graph may lead nowhere
            if record.edge_count == 0 && !record.terminal && index != 0 {
                return Err(DecodeError::DeadEnd);
            }

            for &(_, target) in self.edges(index as u32) {
                let target_depth = &mut depths[target as usize];

                match *target_depth {
                    Some(d) if d != depth + 1 => {
                        return Err(DecodeError::DepthMismatch);
                    },
                    Some(_) => (),
                    None => *target_depth = Some(depth + 1),
                }
            }
        }

        Ok(())
    }
}

#[derive(Default)]
struct BuildNode {
    terminal: bool,
    children: Vec<(char, u32)>,
}

pub struct DawgBuilder {
    cardinality: usize,
    nodes: Vec<BuildNode>,
    word_count: usize,
}

impl DawgBuilder {
    pub fn new(cardinality: usize) -> DawgBuilder {
        DawgBuilder {
            cardinality,
            nodes: vec![BuildNode::default()],
            word_count: 0,
        }
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn add_word(&mut self, word: &str) -> Result<(), IndexError> {
        word_index::check_length(word, self.cardinality)?;

        let mut node = 0usize;

        for letter in word.chars() {
            let children = &self.nodes[node].children;

            node = match children.binary_search_by_key(&letter, |&(ch, _)| ch) {
                Ok(pos) => children[pos].1 as usize,
                Err(pos) => {
                    let next = self.nodes.len();
                    self.nodes.push(BuildNode::default());
                    self.nodes[node].children.insert(pos, (letter, next as u32));
                    next
                },
            };
        }

        if !self.nodes[node].terminal {
            self.nodes[node].terminal = true;
            self.word_count += 1;
        }

        Ok(())
    }

    /// Merges all nodes with identical subtrees and freezes the result.
    pub fn build(self) -> Dawg {
        // Children are always created after their parents so walking
        // backwards visits every subtree before the node that owns it.
        let mut canonical = vec![0u32; self.nodes.len()];
        let mut classes = FxHashMap::<(bool, Vec<(char, u32)>), u32>::default();
        let mut unique = Vec::<(bool, Vec<(char, u32)>)>::new();

        for (index, node) in self.nodes.iter().enumerate().rev() {
            let signature = (
                node.terminal,
                node.children.iter()
                    .map(|&(letter, child)| (letter, canonical[child as usize]))
                    .collect::<Vec<_>>(),
            );

            canonical[index] = *classes.entry(signature.clone())
                .or_insert_with(|| {
                    unique.push(signature);
                    (unique.len() - 1) as u32
                });
        }

        // Renumber breadth-first so that the encoding is deterministic
        // and edges always point forwards.
        let root = canonical[0];
        let mut numbers = vec![None; unique.len()];
        let mut order = Vec::with_capacity(unique.len());
        let mut queue = VecDeque::from([root]);
        numbers[root as usize] = Some(0u32);

        while let Some(class) = queue.pop_front() {
            order.push(class);

            for &(_, child) in unique[class as usize].1.iter() {
                if numbers[child as usize].is_none() {
                    numbers[child as usize] = Some(
                        (order.len() + queue.len()) as u32
                    );
                    queue.push_back(child);
                }
            }
        }

        let mut nodes = Vec::with_capacity(order.len());
        let mut edges = Vec::new();

        for &class in order.iter() {
            let (terminal, children) = &unique[class as usize];

            nodes.push(NodeRecord {
                terminal: *terminal,
                first_edge: edges.len() as u32,
                edge_count: children.len() as u32,
            });

            edges.extend(children.iter().map(|&(letter, child)| {
                (letter, numbers[child as usize].unwrap_or(0))
            }));
        }

        Dawg {
            cardinality: self.cardinality,
            nodes,
            edges,
        }
    }
}

fn write_varint(data: &mut Vec<u8>, mut value: usize) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;

        if value == 0 {
            data.push(byte);
            break;
        }

        data.push(byte | 0x80);
    }
}

fn read_varint(data: &[u8]) -> Option<(&[u8], usize)> {
    let mut value = 0;

    for (byte_num, &byte) in data.iter().enumerate() {
        if (byte_num + 1) * 7 > usize::BITS as usize {
            return None;
        }

        value |= ((byte & 0x7f) as usize) << (byte_num * 7);

        if byte & 0x80 == 0 {
            return Some((&data[byte_num + 1..], value));
        }
    }

    None
}

fn read_letter(data: &[u8]) -> Result<(&[u8], char), DecodeError> {
    let first = *data.first().ok_or(DecodeError::Truncated)?;
    let utf8_len = std::cmp::max(first.leading_ones() as usize, 1);
    let bytes = data.get(0..utf8_len).ok_or(DecodeError::Truncated)?;

    let letter = std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.chars().next())
        .ok_or(DecodeError::InvalidLetter)?;

    Ok((&data[utf8_len..], letter))
}
