//! Mix entity - a resource supplied by a weighted blend of pathways and mixes

use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Metadata};
use crate::core::identity::{EntityKind, EntityRef, Guid, MixId, ParameterId, PathwayId, ResourceId};
use crate::entities::io::Source;

/// Producer feeding a mix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedSource {
    Pathway {
        pathway: PathwayId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Guid>,
    },
    Mix { mix: MixId },
}

impl From<FeedSource> for Source {
    fn from(feed: FeedSource) -> Self {
        match feed {
            FeedSource::Pathway { pathway, output } => Source::Pathway { pathway, output },
            FeedSource::Mix { mix } => Source::Mix { mix },
        }
    }
}

/// One production entry of a mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixFeed {
    #[serde(flatten)]
    pub source: FeedSource,
    /// Fraction of the mix supplied by this feed
    pub share: ParameterId,
}

/// A Mix entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mix {
    pub id: MixId,

    pub name: String,

    /// Resource the mix supplies
    pub output: ResourceId,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feeds: Vec<MixFeed>,

    #[serde(flatten)]
    pub meta: Metadata,
}

impl Mix {
    pub fn new(id: MixId, name: impl Into<String>, output: ResourceId) -> Self {
        Self {
            id,
            name: name.into(),
            output,
            feeds: Vec::new(),
            meta: Metadata::default(),
        }
    }

    pub fn add_pathway_feed(&mut self, pathway: PathwayId, output: Option<Guid>, share: ParameterId) {
        self.feeds.push(MixFeed {
            source: FeedSource::Pathway { pathway, output },
            share,
        });
    }

    pub fn add_mix_feed(&mut self, mix: MixId, share: ParameterId) {
        self.feeds.push(MixFeed {
            source: FeedSource::Mix { mix },
            share,
        });
    }
}

impl Entity for Mix {
    const KIND: EntityKind = EntityKind::Mix;

    fn entity_ref(&self) -> EntityRef {
        EntityRef::Mix(self.id)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn metadata(&self) -> &Metadata {
        &self.meta
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_yaml_is_flat() {
        let yaml = "type: pathway\npathway: 10\nshare: s1\n";
        let feed: MixFeed = serde_yml::from_str(yaml).unwrap();
        assert_eq!(
            feed.source,
            FeedSource::Pathway {
                pathway: PathwayId(10),
                output: None
            }
        );
        assert_eq!(feed.share, ParameterId::new("s1"));
    }
}
