//! Instruction texts for multi-step workflows an agent drives itself, and the
//! bounded loop used when sdkforge drives one of them directly.

use std::future::Future;
use tracing::{debug, info};

/// Steps for renaming a generated model, operation or parameter from
/// `old_name` to `new_name` through a `@@clientName` augmentation.
pub fn client_rename(old_name: &str, new_name: &str) -> String {
    format!(
        r#"Rename `{old_name}` to `{new_name}` in both client.tsp and the generated Java SDK.

1. Synchronize the TypeSpec source.
   Find the module directory containing 'tsp-location.yaml' and run the sync step on it.

2. Find the declaration of `{old_name}`.
   Search the `.tsp` files under 'TempTypeSpecFiles' for the model, operation or
   operation parameter and note its fully qualified path, for example
   `Azure.Communication.MessagesService.OldModelName` for a model or
   `Azure.Communication.MessagesService.AdminOperations.sendMessage` for an operation.

3. Update client.tsp.
   Add a `@@clientName` augmentation that applies `{new_name}` to the Java emitter only:

   ```typespec
   @@clientName(Azure.Communication.MessagesService.OldModelName,
     "{new_name}",
     "java"
   );
   ```

4. Generate the Java SDK.
   Run the generate step on the module directory containing 'tsp-location.yaml'.

5. Update downstream code.
   Replace remaining references to `{old_name}` in hand-written code, samples and
   documentation with `{new_name}`.
"#
    )
}

/// Steps for moving an existing Java SDK module to TypeSpec generation.
///
/// Steps 3 to 6 repeat until the changelog shows no rename candidates.
pub fn typespec_migration() -> String {
    r#"Migrate the Java SDK module to generate from TypeSpec.

1. Initialize the module from the URL of its tspconfig.yaml.
   Run the init step with the URL. It writes 'tsp-location.yaml' into the module.

2. Find the module directory and its pom.xml.
   Run "git status --porcelain" and look for the new "tsp-location.yaml". Its directory
   is the module directory and holds the module's pom.xml.

3. Build the Java SDK.
   Run the build step with the module directory, groupId and artifactId.

4. Get the changelog.
   Run the changelog step on the built jar. The report compares it with the latest
   stable release and is JSON.

5. Review the changelog for renames.
   Do not read CHANGELOG.md in the module; it describes released versions.
   Look at the "breakingChanges" and "newFeature" sections for pairs that differ only
   by name, for example a removed model "*Ip*" next to an added model "*IP*".
   If there are none, the migration is complete and the remaining steps are skipped.

6. Apply the renames to the TypeSpec source.
   Use the client name update instructions for each pair, e.g. rename model
   <new_name> back to <old_name>.

7. Go to step 3.
"#
    .to_string()
}

/// Result of one iteration of a converging workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The iteration changed something; run another.
    Changed,
    /// Nothing left to change.
    Stable,
}

/// How a bounded loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    pub iterations: usize,
    /// `false` when `max_iterations` ran out first.
    pub stable: bool,
}

/// Run `step` until it reports [`Progress::Stable`] or `max_iterations`
/// iterations have run. `step` receives the 1-based iteration number.
pub async fn converge<F, Fut, E>(max_iterations: usize, mut step: F) -> Result<Convergence, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Progress, E>>,
{
    for iteration in 1..=max_iterations {
        let progress = step(iteration).await?;
        debug!(iteration = iteration, progress = ?progress, "iteration finished");
        if progress == Progress::Stable {
            return Ok(Convergence {
                iterations: iteration,
                stable: true,
            });
        }
    }

    info!(max_iterations = max_iterations, "stopped before converging");
    Ok(Convergence {
        iterations: max_iterations,
        stable: false,
    })
}
