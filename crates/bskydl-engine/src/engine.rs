use std::time::Duration;

use bskydl_conf::Settings;
use bskydl_dom::NodeId;

use crate::affordance::Affordance;
use crate::affordance::Affordances;
use crate::filename::FilenameTemplate;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    pub thumbnail_prefix: String,
    pub template: FilenameTemplate,
    pub ordinal_depth: usize,
    pub max_link_hops: usize,
    pub poll_interval: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for EngineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            thumbnail_prefix: settings.thumbnail_prefix.clone(),
            template: FilenameTemplate::new(settings.filename_template.clone()),
            ordinal_depth: settings.ordinal_depth,
            max_link_hops: settings.max_link_hops,
            poll_interval: settings.poll_interval(),
        }
    }
}

/// Association engine state: options plus the affordances attached so
/// far.
///
/// The engine holds no reference to the document. Each call is handed
/// the live tree, so a host can swap the whole document out between
/// ticks; the next tick drops affordances recorded against the old one.
#[derive(Debug, Default)]
pub struct Engine {
    pub(crate) options: EngineOptions,
    pub(crate) affordances: Affordances,
}

impl Engine {
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            affordances: Affordances::default(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The affordance behind a download button, i.e. what a click on
    /// `button` should fetch.
    #[must_use]
    pub fn affordance(&self, button: NodeId) -> Option<&Affordance> {
        self.affordances.get(button)
    }

    /// Affordances in the order they were attached.
    pub fn affordances(&self) -> impl Iterator<Item = &Affordance> {
        self.affordances.iter()
    }

    /// Forget every affordance.
    pub fn reset(&mut self) {
        self.affordances.clear();
    }
}
