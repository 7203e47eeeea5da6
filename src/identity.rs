//! Identity generation for rooms and filesystem nodes
//!
//! Short random ids drawn from the URL-safe alphabet. A generator tracks the ids
//! that are live in its tree plus a window of recently released ones, and never
//! hands out an id from either set.

use crate::types::{NodeId, RoomId};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::{HashSet, VecDeque};

/// URL-safe alphabet, 64 symbols.
pub const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Length of generated room ids.
pub const ROOM_ID_LEN: usize = 10;

/// Length of generated node ids.
pub const NODE_ID_LEN: usize = 10;

/// Released ids kept out of circulation, so late remote deltas cannot hit a new node.
pub const RETIRED_WINDOW: usize = 4096;

/// Draw a random id of `len` symbols.
pub fn random_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[derive(Default)]
struct Issued {
    live: HashSet<String>,
    retired: VecDeque<String>,
    retired_set: HashSet<String>,
}

impl Issued {
    fn taken(&self, id: &str) -> bool {
        self.live.contains(id) || self.retired_set.contains(id)
    }

    fn retire(&mut self, id: String) {
        if self.retired_set.insert(id.clone()) {
            self.retired.push_back(id);
        }
        while self.retired.len() > RETIRED_WINDOW {
            if let Some(old) = self.retired.pop_front() {
                self.retired_set.remove(&old);
            }
        }
    }
}

/// Identity generator. Memory is bounded by live ids plus `RETIRED_WINDOW`.
pub struct IdentityGenerator {
    issued: Mutex<Issued>,
}

impl IdentityGenerator {
    pub fn new() -> Self {
        Self {
            issued: Mutex::new(Issued::default()),
        }
    }

    fn unique(&self, len: usize) -> String {
        let mut issued = self.issued.lock();
        loop {
            let candidate = random_id(len);
            if !issued.taken(&candidate) {
                issued.live.insert(candidate.clone());
                return candidate;
            }
        }
    }

    pub fn room_id(&self) -> RoomId {
        RoomId::new(self.unique(ROOM_ID_LEN))
    }

    pub fn node_id(&self) -> NodeId {
        NodeId::new(self.unique(NODE_ID_LEN))
    }

    /// Mark externally created ids (e.g. from a remote snapshot) as taken.
    pub fn reserve<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>) {
        let mut issued = self.issued.lock();
        for id in ids {
            issued.live.insert(id.as_str().to_string());
        }
    }

    /// Return ids of removed nodes. They stay unavailable for `RETIRED_WINDOW` releases.
    pub fn release<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>) {
        let mut issued = self.issued.lock();
        for id in ids {
            if issued.live.remove(id.as_str()) {
                issued.retire(id.as_str().to_string());
            }
        }
    }

    /// Ids currently live.
    pub fn issued_count(&self) -> usize {
        self.issued.lock().live.len()
    }

    pub fn retired_count(&self) -> usize {
        self.issued.lock().retired.len()
    }
}

impl Default for IdentityGenerator {
    fn default() -> Self {
        Self::new()
    }
}
