use atlas_config::SyncSettings;
use atlas_model::UpdateTag;

/// Where a run's update tag comes from.
///
/// `WallClock` is the production default; `Fixed` exists for
/// deterministic tests. A config-supplied override beats both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TagSource {
    #[default]
    WallClock,
    Fixed(UpdateTag),
}

impl TagSource {
    pub fn generate(&self) -> UpdateTag {
        match self {
            TagSource::WallClock => UpdateTag::now(),
            TagSource::Fixed(tag) => *tag,
        }
    }

    /// Resolves the tag for one run, honoring the config override.
    pub fn resolve(&self, settings: &SyncSettings) -> UpdateTag {
        settings
            .update_tag
            .map(UpdateTag::from)
            .unwrap_or_else(|| self.generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_source_is_deterministic() {
        let source = TagSource::Fixed(UpdateTag(123));
        assert_eq!(source.generate(), UpdateTag(123));
        assert_eq!(source.generate(), UpdateTag(123));
    }

    #[test]
    fn config_override_beats_the_source() {
        let settings = SyncSettings {
            update_tag: Some(999),
            ..SyncSettings::default()
        };
        assert_eq!(
            TagSource::Fixed(UpdateTag(123)).resolve(&settings),
            UpdateTag(999)
        );
    }

    #[test]
    fn wall_clock_used_without_override() {
        let settings = SyncSettings::default();
        let tag = TagSource::WallClock.resolve(&settings);
        assert!(tag.as_i64() > 0);
    }
}
