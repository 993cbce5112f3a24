use crate::resource::{Priority, ResourceKind, ResourceSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RouteBundle {
    pub resources: Vec<ResourceSpec>,
}

impl RouteBundle {
    fn new(resources: impl IntoIterator<Item = ResourceSpec>) -> Self {
        Self {
            resources: resources.into_iter().collect(),
        }
    }
}

/// Bundles preloaded when the user shows intent to open a route.
///
/// Declaring any `[routes.*]` table in a config file replaces this whole
/// table.
pub fn default_routes() -> BTreeMap<String, RouteBundle> {
    use Priority::{Low, Medium};
    use ResourceKind::{Script, Style};

    let mut routes = BTreeMap::new();
    routes.insert(
        "places".to_owned(),
        RouteBundle::new([
            ResourceSpec::new("/assets/places.js", Script, Medium),
            ResourceSpec::new("/assets/places.css", Style, Medium),
            ResourceSpec::new("/assets/map-view.js", Script, Low),
        ]),
    );
    routes.insert(
        "place-detail".to_owned(),
        RouteBundle::new([
            ResourceSpec::new("/assets/place-detail.js", Script, Medium),
            ResourceSpec::new("/assets/gallery.js", Script, Low),
        ]),
    );
    routes.insert(
        "planner".to_owned(),
        RouteBundle::new([
            ResourceSpec::new("/assets/planner.js", Script, Medium),
            ResourceSpec::new("/assets/planner.css", Style, Medium),
            ResourceSpec::new("/assets/itinerary-export.js", Script, Low),
        ]),
    );
    routes.insert(
        "community".to_owned(),
        RouteBundle::new([
            ResourceSpec::new("/assets/community.js", Script, Medium),
            ResourceSpec::new("/assets/community.css", Style, Low),
        ]),
    );
    routes.insert(
        "profile".to_owned(),
        RouteBundle::new([
            ResourceSpec::new("/assets/profile.js", Script, Medium),
            ResourceSpec::new("/assets/subscription.js", Script, Low),
        ]),
    );
    routes
}

/// Resources warmed at application start.
pub fn default_critical() -> Vec<ResourceSpec> {
    use Priority::{High, Medium};
    use ResourceKind::{Font, Image, Style};

    vec![
        ResourceSpec::new("/assets/app.css", Style, High),
        ResourceSpec::new("/fonts/inter-var.woff2", Font, High),
        ResourceSpec::new("/images/logo.svg", Image, High),
        ResourceSpec::new("/images/hero.webp", Image, Medium),
    ]
}
