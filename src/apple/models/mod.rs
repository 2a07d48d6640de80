use serde::Deserialize;

pub mod library;

/// One page of an Apple Music API collection response.
#[derive(Deserialize, Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub next: Option<String>,
}
