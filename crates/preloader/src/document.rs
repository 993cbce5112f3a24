#![forbid(unsafe_code)]

//! Minimal model of the document head.
//!
//! Hint elements are compared by attribute, which is how the bootstrap code
//! and the link hinter decide whether an equivalent hint already exists.

use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkRel {
    DnsPrefetch,
    Preconnect,
    Preload,
}

impl LinkRel {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkRel::DnsPrefetch => "dns-prefetch",
            LinkRel::Preconnect => "preconnect",
            LinkRel::Preload => "preload",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HintElement {
    Link {
        rel: LinkRel,
        href: String,
        as_kind: Option<&'static str>,
        crossorigin: bool,
    },
    Meta {
        name: String,
        content: String,
    },
}

impl HintElement {
    pub fn dns_prefetch(origin: impl Into<String>) -> Self {
        HintElement::Link {
            rel: LinkRel::DnsPrefetch,
            href: origin.into(),
            as_kind: None,
            crossorigin: false,
        }
    }

    pub fn preconnect(origin: impl Into<String>, crossorigin: bool) -> Self {
        HintElement::Link {
            rel: LinkRel::Preconnect,
            href: origin.into(),
            as_kind: None,
            crossorigin,
        }
    }

    pub fn meta(name: impl Into<String>, content: impl Into<String>) -> Self {
        HintElement::Meta {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Whether `other` is an existing equivalent of this element.
    ///
    /// Links match on `rel` and `href`; metas match on `name` only, so a page
    /// that already declares a viewport keeps its own content.
    pub fn matches(&self, other: &HintElement) -> bool {
        match (self, other) {
            (
                HintElement::Link { rel, href, .. },
                HintElement::Link {
                    rel: other_rel,
                    href: other_href,
                    ..
                },
            ) => rel == other_rel && href == other_href,
            (HintElement::Meta { name, .. }, HintElement::Meta { name: other_name, .. }) => {
                name == other_name
            }
            _ => false,
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        match self {
            HintElement::Link {
                rel,
                href,
                as_kind,
                crossorigin,
            } => {
                let _ = write!(out, r#"<link rel="{}" href="{}""#, rel.as_str(), escape(href));
                if let Some(kind) = as_kind {
                    let _ = write!(out, r#" as="{kind}""#);
                }
                if *crossorigin {
                    out.push_str(" crossorigin");
                }
                out.push('>');
            }
            HintElement::Meta { name, content } => {
                let _ = write!(
                    out,
                    r#"<meta name="{}" content="{}">"#,
                    escape(name),
                    escape(content)
                );
            }
        }
        out
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Head mutation primitive.
pub trait HeadWriter: Send {
    fn contains(&self, element: &HintElement) -> bool;
    fn insert(&mut self, element: HintElement);

    /// Insert `element` unless an equivalent one exists. Returns whether it
    /// was inserted.
    fn ensure(&mut self, element: HintElement) -> bool {
        if self.contains(&element) {
            return false;
        }
        self.insert(element);
        true
    }
}

#[derive(Debug, Default, Clone)]
pub struct HeadDocument {
    elements: Vec<HintElement>,
}

impl HeadDocument {
    pub fn elements(&self) -> &[HintElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn render(&self) -> String {
        self.elements
            .iter()
            .map(HintElement::to_html)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl HeadWriter for HeadDocument {
    fn contains(&self, element: &HintElement) -> bool {
        self.elements.iter().any(|existing| element.matches(existing))
    }

    fn insert(&mut self, element: HintElement) {
        self.elements.push(element);
    }
}
