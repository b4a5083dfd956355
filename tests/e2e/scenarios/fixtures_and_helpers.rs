use crate::harness::{Assertion, Scenario};

/// Fixture files are tracked and land in the seed snapshot
#[test]
fn test_fixture_loading() {
    Scenario::new("fixture_loading")
        .from_fixture("default")
        .init()
        .assert_uncommitted(false)
        .assert(Assertion::Custom(Box::new(|engine| {
            let seed = engine.log(None, 1)?.pop().ok_or_else(|| anyhow::anyhow!("no seed"))?;
            for path in ["Cargo.toml", "README.md", "src/main.rs", "src/lib.rs"] {
                anyhow::ensure!(
                    seed.files_snapshot.contains_key(path),
                    "{} missing from {:?}",
                    path,
                    seed.files_snapshot.keys().collect::<Vec<_>>()
                );
            }
            Ok(())
        })))
        .writes("src/main.rs", b"fn main() {}\n")
        .assert_uncommitted(true)
        .run()
        .unwrap();
}

/// Messages suggested from the changed files
#[test]
fn test_suggested_commit_message() {
    Scenario::new("suggested_message")
        .from_fixture("default")
        .init()
        .writes("src/lib.rs", b"pub fn greet() {}\n")
        .writes("src/extra.rs", b"\n")
        .assert(Assertion::Custom(Box::new(|engine| {
            let message = engine.suggest_commit_message()?;
            anyhow::ensure!(message == "Update src/extra.rs and 1 more", "got {:?}", message);
            Ok(())
        })))
        .run()
        .unwrap();
}
