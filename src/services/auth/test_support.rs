/*
 * Responsibility
 * - filter / middleware テスト用の test double
 * - acquire/release/accept の呼び出し回数と最後に渡された token を記録する
 */
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use crate::api::v1::extractors::Principal;
use crate::services::auth::context::SecurityContext;
use crate::services::auth::credential::{CredentialProvider, ServerCredential};
use crate::services::auth::error::AuthError;

/// mock engine が leg 毎に返す出力 token。
pub const MOCK_OUTPUT: &[u8] = b"mock-output";

#[derive(Clone)]
pub enum MockBehavior {
    /// acquire が LoginFailure を返す
    LoginFails,
    /// accept_token が SecurityContext エラーを返す
    AcceptFails,
    /// `legs` 回 accept されたら established になる
    Establish { legs: u32, principal: String },
}

impl MockBehavior {
    pub fn establish_as(principal: &str) -> Self {
        Self::establish_after(1, principal)
    }

    pub fn establish_after(legs: u32, principal: &str) -> Self {
        Self::Establish {
            legs,
            principal: principal.to_string(),
        }
    }
}

#[derive(Default)]
struct Counters {
    acquires: AtomicUsize,
    releases: AtomicUsize,
    contexts_created: AtomicUsize,
    context_accepts: AtomicUsize,
    last_token: Mutex<Option<Vec<u8>>>,
}

pub struct MockProvider {
    behavior: MockBehavior,
    counters: Arc<Counters>,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            counters: Arc::new(Counters::default()),
        })
    }

    pub fn acquires(&self) -> usize {
        self.counters.acquires.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.counters.releases.load(Ordering::SeqCst)
    }

    pub fn contexts_created(&self) -> usize {
        self.counters.contexts_created.load(Ordering::SeqCst)
    }

    pub fn context_accepts(&self) -> usize {
        self.counters.context_accepts.load(Ordering::SeqCst)
    }

    pub fn last_token(&self) -> Option<Vec<u8>> {
        self.counters.last_token.lock().expect("mock lock").clone()
    }
}

impl CredentialProvider for MockProvider {
    fn acquire(&self) -> Result<Box<dyn ServerCredential>, AuthError> {
        self.counters.acquires.fetch_add(1, Ordering::SeqCst);
        if matches!(self.behavior, MockBehavior::LoginFails) {
            return Err(AuthError::LoginFailure("mock login failure".into()));
        }
        Ok(Box::new(MockCredential {
            behavior: self.behavior.clone(),
            counters: self.counters.clone(),
            used: AtomicBool::new(false),
        }))
    }

    fn release(&self, credential: Box<dyn ServerCredential>) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
        drop(credential);
    }
}

struct MockCredential {
    behavior: MockBehavior,
    counters: Arc<Counters>,
    used: AtomicBool,
}

impl ServerCredential for MockCredential {
    // 本物と同じく single-use。2 回呼ばれたらテストを落とす
    fn create_context(&self) -> Result<Box<dyn SecurityContext>, AuthError> {
        if self.used.swap(true, Ordering::SeqCst) {
            return Err(AuthError::SecurityContext(
                "credential already handed to a context".into(),
            ));
        }
        self.counters.contexts_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockContext {
            behavior: self.behavior.clone(),
            counters: self.counters.clone(),
            accepted_legs: 0,
        }))
    }
}

struct MockContext {
    behavior: MockBehavior,
    counters: Arc<Counters>,
    accepted_legs: u32,
}

impl SecurityContext for MockContext {
    fn accept_token(&mut self, token: &[u8]) -> Result<Vec<u8>, AuthError> {
        self.counters.context_accepts.fetch_add(1, Ordering::SeqCst);
        *self.counters.last_token.lock().expect("mock lock") = Some(token.to_vec());

        match &self.behavior {
            MockBehavior::AcceptFails => {
                Err(AuthError::SecurityContext("mock mechanism failure".into()))
            }
            _ => {
                self.accepted_legs += 1;
                Ok(MOCK_OUTPUT.to_vec())
            }
        }
    }

    fn is_established(&self) -> bool {
        match &self.behavior {
            MockBehavior::Establish { legs, .. } => self.accepted_legs >= *legs,
            _ => false,
        }
    }

    fn source_principal(&mut self) -> Result<Principal, AuthError> {
        match &self.behavior {
            MockBehavior::Establish { principal, .. } if self.is_established() => {
                Ok(Principal::new(principal.clone()))
            }
            _ => Err(AuthError::SecurityContext(
                "source name requested before establishment".into(),
            )),
        }
    }
}
