use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preconnect {
    pub origin: String,
    #[serde(default)]
    pub crossorigin: bool,
}

/// Document-level hints installed once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Hints {
    /// External origins that get a `dns-prefetch` link.
    pub dns_prefetch: Vec<String>,

    /// Origins that get a `preconnect` link. Normally a subset of
    /// `dns_prefetch`.
    pub preconnect: Vec<Preconnect>,

    /// Content of the viewport meta tag inserted when the document has none.
    pub viewport: String,
}

impl Default for Hints {
    fn default() -> Self {
        Self {
            dns_prefetch: vec![
                "https://fonts.googleapis.com".to_owned(),
                "https://fonts.gstatic.com".to_owned(),
                "https://api.mapbox.com".to_owned(),
                "https://images.unsplash.com".to_owned(),
            ],
            preconnect: vec![
                Preconnect {
                    origin: "https://fonts.googleapis.com".to_owned(),
                    crossorigin: false,
                },
                Preconnect {
                    origin: "https://fonts.gstatic.com".to_owned(),
                    crossorigin: true,
                },
            ],
            viewport: "width=device-width, initial-scale=1".to_owned(),
        }
    }
}
