#![forbid(unsafe_code)]

use crate::document::{HeadWriter, HintElement};
use config::{Hints, Preconnect};
use tracing::debug;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapReport {
    pub dns_prefetch: usize,
    pub preconnect: usize,
    pub viewport: bool,
}

impl BootstrapReport {
    pub fn inserted(&self) -> usize {
        self.dns_prefetch + self.preconnect + usize::from(self.viewport)
    }
}

/// One-shot document hints: dns-prefetch and preconnect links for known
/// external origins plus a viewport meta tag.
#[derive(Debug, Clone)]
pub struct HintBootstrap {
    dns_prefetch: Vec<String>,
    preconnect: Vec<Preconnect>,
    viewport: String,
}

impl HintBootstrap {
    pub fn new(hints: &Hints) -> Self {
        Self {
            dns_prefetch: hints.dns_prefetch.clone(),
            preconnect: hints.preconnect.clone(),
            viewport: hints.viewport.clone(),
        }
    }

    /// Install the hints. Elements that already exist are left alone, so
    /// applying twice inserts nothing the second time.
    pub fn apply(&self, head: &mut dyn HeadWriter) -> BootstrapReport {
        let mut report = BootstrapReport::default();

        for origin in &self.dns_prefetch {
            if head.ensure(HintElement::dns_prefetch(origin.as_str())) {
                report.dns_prefetch += 1;
            }
        }
        for preconnect in &self.preconnect {
            if head.ensure(HintElement::preconnect(
                preconnect.origin.as_str(),
                preconnect.crossorigin,
            )) {
                report.preconnect += 1;
            }
        }
        report.viewport = head.ensure(HintElement::meta("viewport", self.viewport.as_str()));

        debug!(?report, "bootstrap hints applied");
        report
    }
}
