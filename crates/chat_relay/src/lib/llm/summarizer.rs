use std::{
    fmt::{Debug, Display},
    future::Future,
};

use serde::Deserialize;

pub trait Summarizer {
    type Error: Debug + Display;

    fn summarize(
        &self,
        content: &str,
    ) -> impl Future<Output = Result<SummaryResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}
