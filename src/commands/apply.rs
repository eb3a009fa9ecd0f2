use crate::PatmanContext;
use crate::lock::ManifestLock;
use crate::manifest::{EventOutcome, PatternEvent};
use anyhow::{Result, bail};

/// Apply one event to the manifest
///
/// The event is applied as given; include and exclude globs are not
/// consulted.
///
/// # Errors
///
/// Returns an error if:
/// - Another process holds the manifest lock
/// - The precompiler cannot be built from the config
/// - The path lies outside the patterns root
/// - The manifest could not be written
pub fn execute(ctx: &PatmanContext, event: &PatternEvent) -> Result<EventOutcome> {
    let _lock = ManifestLock::acquire(&ctx.manifest_path())?;
    let mut store = ctx.open_store()?;

    let outcome = store.apply(event)?;
    match outcome {
        EventOutcome::Persisted => {
            super::print_success(&format!("{event}: manifest updated"));
        }
        EventOutcome::Recompiled => {
            super::print_success(&format!("{event}: precompile triggered"));
        }
        EventOutcome::Unmatched => {
            super::print_info(&format!("{event}: no matching pattern, nothing to do"));
        }
        EventOutcome::Ignored => {
            super::print_info(&format!("{event}: path is a directory, ignored"));
        }
        EventOutcome::WriteFailed => {
            bail!(
                "{event}: failed to write manifest to {}",
                ctx.manifest_path().display()
            );
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use crate::test_utils::fixtures::TestProject;

    fn read_manifest(project: &TestProject) -> Result<Manifest> {
        Manifest::from_json(&std::fs::read_to_string(project.context.manifest_path())?)
    }

    #[test]
    fn test_apply_added_then_deleted() -> Result<()> {
        let project = TestProject::new()?;
        let added = PatternEvent::Added {
            path: "atoms/button.hbs".to_string(),
        };
        assert_eq!(execute(&project.context, &added)?, EventOutcome::Persisted);

        let deleted = PatternEvent::Deleted {
            path: "atoms/button.hbs".to_string(),
        };
        assert_eq!(execute(&project.context, &deleted)?, EventOutcome::Persisted);

        let manifest = read_manifest(&project)?;
        assert_eq!(manifest.patterns.len(), 1);
        assert!(manifest.patterns[0].is_deleted());
        Ok(())
    }

    #[test]
    fn test_apply_on_directory_is_ignored() -> Result<()> {
        let project = TestProject::new()?;
        std::fs::create_dir_all(project.context.patterns_root().join("atoms"))?;

        let event = PatternEvent::Added {
            path: "atoms".to_string(),
        };
        assert_eq!(execute(&project.context, &event)?, EventOutcome::Ignored);
        assert!(!project.context.manifest_path().exists());
        Ok(())
    }

    #[test]
    fn test_apply_outside_root_fails() -> Result<()> {
        let project = TestProject::new()?;
        let event = PatternEvent::Added {
            path: "/somewhere/else/button.hbs".to_string(),
        };
        assert!(execute(&project.context, &event).is_err());
        Ok(())
    }
}
