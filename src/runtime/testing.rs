//! Mock implementations for testing
//!
//! Collaborators with fixed, input-driven behavior plus an in-memory
//! database, so flows and the router can be tested without files or
//! network.

use super::traits::*;
use super::Router;
use crate::config::Platform;
use crate::db::{
    BanEntry, CustomAnswer, Database, DbResult, RegistrationInfo, UserId, UserProfile,
};
use crate::moderation::ReservedWords;
use crate::services::{
    FileKeyboards, GraphService, QueryService, ScheduleSlot, ScheduleSource, ServiceError, Services,
    SubjectLink, SubjectLinkSource, TextFilter,
};
use crate::state_machine::action::ImageRef;
use crate::state_machine::event::FlowContext;
use crate::state_machine::state::SessionState;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Barrier;

pub const ADMIN: &str = "100";
pub const CALCULUS_LINK: &str = "https://example.org/calculus";

// ============================================================================
// Mock collaborators
// ============================================================================

/// Knows one subject of the first course; other courses fail
#[derive(Default)]
pub struct MockLinks;

#[async_trait]
impl SubjectLinkSource for MockLinks {
    async fn subjects(&self, course: &str) -> Result<Vec<SubjectLink>, ServiceError> {
        match course {
            "1 курс" => Ok(vec![SubjectLink {
                subject: "матанализ".into(),
                link: CALCULUS_LINK.into(),
            }]),
            other => Err(ServiceError::not_found(format!("no links for {other}"))),
        }
    }
}

/// Two slots every day; the fourth course has no timetable
#[derive(Default)]
pub struct MockSchedule;

#[async_trait]
impl ScheduleSource for MockSchedule {
    async fn day(&self, course: &str, _group: &str, _day: &str) -> Result<Vec<ScheduleSlot>, ServiceError> {
        if course == "4 курс" {
            return Err(ServiceError::not_found("no timetable"));
        }
        Ok(vec![
            ScheduleSlot {
                time: "9:00".into(),
                cell: Some("Матанализ;Лекция;Иванов И.И.;101;Очно".into()),
            },
            ScheduleSlot {
                time: "10:45".into(),
                cell: None,
            },
        ])
    }
}

/// `fail` errors, `empty` answers nothing, anything else is echoed
#[derive(Default)]
pub struct MockQuery;

#[async_trait]
impl QueryService for MockQuery {
    async fn ask(&self, query: &str) -> Result<String, ServiceError> {
        match query {
            "fail" => Err(ServiceError::network("query backend down")),
            "empty" => Ok(String::new()),
            other => Ok(format!("answer: {other}")),
        }
    }
}

#[derive(Default)]
pub struct MockGraph;

#[async_trait]
impl GraphService for MockGraph {
    async fn plot(&self, expression: &str, var_count: u8) -> Result<ImageRef, ServiceError> {
        if expression == "fail" {
            return Err(ServiceError::empty("no plot"));
        }
        Ok(ImageRef::File(format!("graphs/test_{var_count}.jpg").into()))
    }
}

/// Masks "плохослово"; `filter-down` makes the filter fail
#[derive(Default)]
pub struct MockFilter;

#[async_trait]
impl TextFilter for MockFilter {
    async fn filter(&self, text: &str) -> Result<String, ServiceError> {
        if text == "filter-down" {
            return Err(ServiceError::network("filter unavailable"));
        }
        Ok(text.replace("плохослово", "**********"))
    }
}

pub fn mock_services() -> Services {
    Services {
        links: Arc::new(MockLinks),
        schedule: Arc::new(MockSchedule),
        query: Arc::new(MockQuery),
        graph: Arc::new(MockGraph),
        filter: Arc::new(MockFilter),
        keyboards: Arc::new(FileKeyboards::generated(Platform::Vk)),
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Everything a single flow needs, owned in one place
pub struct FlowFixture {
    pub db: Database,
    pub services: Services,
    pub reserved: ReservedWords,
}

impl FlowFixture {
    pub fn context(&self) -> FlowContext<'_> {
        FlowContext {
            services: &self.services,
            content: &self.db,
            reserved: &self.reserved,
        }
    }
}

pub fn flow_fixture() -> FlowFixture {
    FlowFixture {
        db: Database::open_in_memory(Platform::Vk).unwrap(),
        services: mock_services(),
        reserved: ReservedWords::builtin(),
    }
}

pub fn router_with<S: Storage>(store: S) -> Router<S> {
    let admins: HashSet<UserId> = [UserId::from(ADMIN)].into_iter().collect();
    Router::new(store, mock_services(), admins, Some("https://disk.example.org".into()))
}

/// Router over a fresh in-memory database
pub fn test_router() -> Router<Database> {
    router_with(Database::open_in_memory(Platform::Vk).unwrap())
}

/// Router over a database where `user` finished registration
pub fn registered_router(user: &str) -> Router<Database> {
    let router = test_router();
    router
        .store()
        .save_registration(&UserId::from(user), &RegistrationInfo::complete("1 курс", "б03-0101"))
        .unwrap();
    router
}

// ============================================================================
// Barrier store
// ============================================================================

/// Holds every `load_session` at a barrier until `parties` readers have
/// loaded, so concurrent turns of one user are forced onto the same
/// snapshot.
pub struct BarrierStore {
    pub inner: Database,
    barrier: Barrier,
}

impl BarrierStore {
    pub fn new(inner: Database, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
        }
    }
}

#[async_trait]
impl SessionStore for BarrierStore {
    async fn load_session(&self, user: &UserId) -> DbResult<SessionState> {
        let session = self.inner.load_session(user)?;
        self.barrier.wait().await;
        Ok(session)
    }

    async fn save_session(&self, user: &UserId, session: &SessionState) -> DbResult<()> {
        self.inner.save_session(user, session)
    }

    async fn registration(&self, user: &UserId) -> DbResult<Option<RegistrationInfo>> {
        self.inner.registration(user)
    }

    async fn save_registration(&self, user: &UserId, info: &RegistrationInfo) -> DbResult<()> {
        self.inner.save_registration(user, info)
    }

    async fn reset_all(&self) -> DbResult<usize> {
        self.inner.reset_all_sessions()
    }
}

#[async_trait]
impl ProfileStore for BarrierStore {
    async fn user_profile(&self, user: &UserId) -> DbResult<Option<UserProfile>> {
        self.inner.user_profile(user)
    }
}

#[async_trait]
impl ContentStore for BarrierStore {
    async fn command_answer(&self, question: &str) -> DbResult<Option<String>> {
        self.inner.command_answer(question)
    }

    async fn photo_answer(&self, question: &str) -> DbResult<Option<String>> {
        self.inner.photo_answer(question)
    }

    async fn photo_questions(&self) -> DbResult<Vec<String>> {
        self.inner.photo_questions()
    }

    async fn custom_answer(&self, question: &str) -> DbResult<Option<CustomAnswer>> {
        self.inner.custom_answer(question)
    }

    async fn custom_questions(&self) -> DbResult<Vec<String>> {
        self.inner.custom_questions()
    }

    async fn add_custom_answer(&self, owner: &UserId, question: &str, answer: &str) -> DbResult<bool> {
        self.inner.add_custom_answer(owner, question, answer)
    }

    async fn delete_custom_answer(&self, question: &str) -> DbResult<bool> {
        self.inner.delete_custom_answer(question)
    }
}

#[async_trait]
impl BanStore for BarrierStore {
    async fn ban_entry(&self, user: &UserId) -> DbResult<Option<BanEntry>> {
        self.inner.ban_entry(user)
    }

    async fn ban(&self, user: &UserId, reason: &str) -> DbResult<()> {
        self.inner.ban(user, reason)
    }

    async fn unban(&self, user: &UserId) -> DbResult<bool> {
        self.inner.unban(user)
    }
}
