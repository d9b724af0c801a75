/*
 * Responsibility
 * - session lifetime 時の未確立コンテキストの置き場
 * - peer アドレス単位で park / take する (take は常に entry を取り除く)
 * - 放棄されたハンドシェイクは TTL と上限数で回収する (無限に溜めない)
 * - プロセス内で唯一の共有可変状態。Mutex で守る
 */
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::services::auth::context::SecurityContext;

/// 同時に park しておけるハンドシェイク数。超過時は最も古い entry を捨てる。
const MAX_PENDING: usize = 1024;
/// park されてからこの時間 resume されなければ放棄とみなす。
const PENDING_TTL: Duration = Duration::from_secs(30);

struct Pending {
    context: Box<dyn SecurityContext>,
    parked_at: Instant,
    // 挿入順。Instant の分解能に依存せず最古 entry を特定するため
    seq: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<SocketAddr, Pending>,
    next_seq: u64,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
    capacity: usize,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_limits(MAX_PENDING, PENDING_TTL)
    }

    fn with_limits(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            capacity,
            ttl,
        }
    }

    pub fn take(&self, peer: SocketAddr) -> Option<Box<dyn SecurityContext>> {
        let pending = self
            .inner
            .lock()
            .expect("session store mutex poisoned")
            .entries
            .remove(&peer)?;
        if pending.parked_at.elapsed() < self.ttl {
            Some(pending.context)
        } else {
            // 期限切れはハンドシェイク最初からやり直し
            None
        }
    }

    pub fn park(&self, peer: SocketAddr, context: Box<dyn SecurityContext>) {
        let mut inner = self.inner.lock().expect("session store mutex poisoned");

        let ttl = self.ttl;
        inner.entries.retain(|_, p| p.parked_at.elapsed() < ttl);

        if inner.entries.len() >= self.capacity && !inner.entries.contains_key(&peer) {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, p)| p.seq)
                .map(|(peer, _)| *peer);
            if let Some(oldest) = oldest {
                tracing::debug!(peer = %oldest, "evicting oldest pending handshake");
                inner.entries.remove(&oldest);
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            peer,
            Pending {
                context,
                parked_at: Instant::now(),
                seq,
            },
        );
    }
}
