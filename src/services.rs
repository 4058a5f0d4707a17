//! External collaborators
//!
//! Every source of content the router does not own sits behind one of these
//! traits: lecture links, the timetable, the math query and plotting
//! service, the profanity filter and the keyboard renderer.

mod error;
mod filter;
mod keyboards;
mod links;
mod schedule;
mod wolfram;

pub use error::{ServiceError, ServiceErrorKind};
pub use filter::WordListFilter;
pub use keyboards::FileKeyboards;
pub use links::CsvLinks;
pub use schedule::CsvSchedule;
pub use wolfram::WolframAlpha;

use crate::state_machine::action::{ImageRef, KeyboardHandle, KeyboardName};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// One row of a course's link list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectLink {
    /// Folded subject name, matched against folded input
    pub subject: String,
    pub link: String,
}

/// One class slot of a day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSlot {
    pub time: String,
    /// `subject;kind;teacher;room;format`, or `None` when there is no class
    pub cell: Option<String>,
}

#[async_trait]
pub trait SubjectLinkSource: Send + Sync {
    async fn subjects(&self, course: &str) -> Result<Vec<SubjectLink>, ServiceError>;
}

#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Slots of `day` for one group, in time order
    async fn day(&self, course: &str, group: &str, day: &str) -> Result<Vec<ScheduleSlot>, ServiceError>;
}

#[async_trait]
pub trait QueryService: Send + Sync {
    async fn ask(&self, query: &str) -> Result<String, ServiceError>;
}

#[async_trait]
pub trait GraphService: Send + Sync {
    async fn plot(&self, expression: &str, var_count: u8) -> Result<ImageRef, ServiceError>;
}

/// Returns the text with forbidden words masked; unchanged text is clean.
#[async_trait]
pub trait TextFilter: Send + Sync {
    async fn filter(&self, text: &str) -> Result<String, ServiceError>;
}

pub trait KeyboardRenderer: Send + Sync {
    fn render(&self, name: &KeyboardName) -> KeyboardHandle;
}

/// The full set of collaborators handed to the router
#[derive(Clone)]
pub struct Services {
    pub links: Arc<dyn SubjectLinkSource>,
    pub schedule: Arc<dyn ScheduleSource>,
    pub query: Arc<dyn QueryService>,
    pub graph: Arc<dyn GraphService>,
    pub filter: Arc<dyn TextFilter>,
    pub keyboards: Arc<dyn KeyboardRenderer>,
}

impl Services {
    /// Wrap every async collaborator in a [`Logged`] decorator
    #[must_use]
    pub fn with_logging(self) -> Self {
        Self {
            links: Arc::new(Logged::new("links", self.links)),
            schedule: Arc::new(Logged::new("schedule", self.schedule)),
            query: Arc::new(Logged::new("query", self.query)),
            graph: Arc::new(Logged::new("graph", self.graph)),
            filter: Arc::new(Logged::new("filter", self.filter)),
            keyboards: self.keyboards,
        }
    }
}

// ============================================================================
// Logging decorator
// ============================================================================

/// Records duration and outcome of every call to the wrapped collaborator
pub struct Logged<T: ?Sized> {
    name: &'static str,
    inner: Arc<T>,
}

impl<T: ?Sized> Logged<T> {
    pub fn new(name: &'static str, inner: Arc<T>) -> Self {
        Self { name, inner }
    }

    async fn observe<R: Send>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<R, ServiceError>> + Send,
    ) -> Result<R, ServiceError> {
        let start = Instant::now();
        let result = call.await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(
                    service = self.name,
                    op,
                    duration_ms = %duration.as_millis(),
                    "Service call completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    service = self.name,
                    op,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    operational = e.kind.is_operational(),
                    "Service call failed"
                );
            }
        }

        result
    }
}

#[async_trait]
impl<T: SubjectLinkSource + ?Sized> SubjectLinkSource for Logged<T> {
    async fn subjects(&self, course: &str) -> Result<Vec<SubjectLink>, ServiceError> {
        self.observe("subjects", self.inner.subjects(course)).await
    }
}

#[async_trait]
impl<T: ScheduleSource + ?Sized> ScheduleSource for Logged<T> {
    async fn day(&self, course: &str, group: &str, day: &str) -> Result<Vec<ScheduleSlot>, ServiceError> {
        self.observe("day", self.inner.day(course, group, day)).await
    }
}

#[async_trait]
impl<T: QueryService + ?Sized> QueryService for Logged<T> {
    async fn ask(&self, query: &str) -> Result<String, ServiceError> {
        self.observe("ask", self.inner.ask(query)).await
    }
}

#[async_trait]
impl<T: GraphService + ?Sized> GraphService for Logged<T> {
    async fn plot(&self, expression: &str, var_count: u8) -> Result<ImageRef, ServiceError> {
        self.observe("plot", self.inner.plot(expression, var_count)).await
    }
}

#[async_trait]
impl<T: TextFilter + ?Sized> TextFilter for Logged<T> {
    async fn filter(&self, text: &str) -> Result<String, ServiceError> {
        self.observe("filter", self.inner.filter(text)).await
    }
}

// ============================================================================
// Stand-in for unconfigured collaborators
// ============================================================================

/// Fails every call. Used when a deployment lacks the credentials or files
/// for a collaborator.
#[derive(Debug, Clone)]
pub struct UnavailableService {
    what: &'static str,
}

impl UnavailableService {
    pub fn new(what: &'static str) -> Self {
        Self { what }
    }

    fn error(&self) -> ServiceError {
        ServiceError::unavailable(format!("{} is not configured", self.what))
    }
}

#[async_trait]
impl SubjectLinkSource for UnavailableService {
    async fn subjects(&self, _course: &str) -> Result<Vec<SubjectLink>, ServiceError> {
        Err(self.error())
    }
}

#[async_trait]
impl ScheduleSource for UnavailableService {
    async fn day(&self, _course: &str, _group: &str, _day: &str) -> Result<Vec<ScheduleSlot>, ServiceError> {
        Err(self.error())
    }
}

#[async_trait]
impl QueryService for UnavailableService {
    async fn ask(&self, _query: &str) -> Result<String, ServiceError> {
        Err(self.error())
    }
}

#[async_trait]
impl GraphService for UnavailableService {
    async fn plot(&self, _expression: &str, _var_count: u8) -> Result<ImageRef, ServiceError> {
        Err(self.error())
    }
}

#[async_trait]
impl TextFilter for UnavailableService {
    async fn filter(&self, _text: &str) -> Result<String, ServiceError> {
        Err(self.error())
    }
}
