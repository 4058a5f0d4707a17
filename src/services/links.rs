//! Lecture links from per-course CSV files

use super::{ServiceError, SubjectLink, SubjectLinkSource};
use async_trait::async_trait;
use std::path::PathBuf;

/// Reads `<dir>/<course>.csv` with a `subject,link` header on every call,
/// so edited files take effect without a restart.
#[derive(Debug, Clone)]
pub struct CsvLinks {
    dir: PathBuf,
}

impl CsvLinks {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

fn parse_links(raw: &str) -> Result<Vec<SubjectLink>, ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let mut links = Vec::new();
    for record in reader.records() {
        let record = record?;
        let (Some(subject), Some(link)) = (record.get(0), record.get(1)) else {
            return Err(ServiceError::parse(format!(
                "Link row {} has {} fields, expected 2",
                links.len() + 1,
                record.len()
            )));
        };
        if subject.is_empty() {
            continue;
        }
        links.push(SubjectLink {
            subject: subject.to_lowercase(),
            link: link.to_string(),
        });
    }
    Ok(links)
}

#[async_trait]
impl SubjectLinkSource for CsvLinks {
    async fn subjects(&self, course: &str) -> Result<Vec<SubjectLink>, ServiceError> {
        let path = self.dir.join(format!("{course}.csv"));
        let raw = tokio::fs::read_to_string(&path).await?;
        let links = parse_links(&raw)?;
        tracing::debug!(course, path = %path.display(), count = links.len(), "Loaded subject links");
        Ok(links)
    }
}
