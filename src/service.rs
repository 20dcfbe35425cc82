use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::datasets::Dataset;
use crate::error::PipelineError;
use crate::fetch::Fetcher;
use crate::pipeline::Pipeline;
use crate::pipeline::table::{Payload, Selection};
use crate::pipeline::typer::ColumnTyper;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub erro: String,
}

/// What an endpoint hands back: data or `{"erro": "..."}`, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Success(Payload),
    Failure(ErrorInfo),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

impl From<Result<Payload, PipelineError>> for Outcome {
    fn from(result: Result<Payload, PipelineError>) -> Self {
        match result {
            Ok(payload) => Outcome::Success(payload),
            Err(e) => Outcome::Failure(ErrorInfo { erro: e.to_string() }),
        }
    }
}

/// Dataset endpoints over one fetcher and one pipeline. Runs share nothing
/// mutable, so one `Service` can serve concurrent callers.
pub struct Service {
    base_url: String,
    fetcher: Fetcher,
    pipeline: Pipeline,
}

impl Service {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Service {
            base_url: settings.base_url.clone(),
            fetcher: Fetcher::new(settings)?,
            pipeline: Pipeline::new(ColumnTyper::from_settings(settings)?),
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub async fn dataset(&self, dataset: Dataset) -> Outcome {
        info!("Running dataset {}", dataset.name());
        self.url(&dataset.url(&self.base_url), dataset.selection()).await
    }

    pub async fn url(&self, url: &str, selection: Selection) -> Outcome {
        let result = self.run(url, selection).await;
        if let Err(e) = &result {
            warn!("Run for {} failed: {}", url, e);
        }
        result.into()
    }

    async fn run(&self, url: &str, selection: Selection) -> Result<Payload, PipelineError> {
        let doc = self.fetcher.fetch(url).await?;
        self.pipeline.process(&doc, selection)
    }
}
