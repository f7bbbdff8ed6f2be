//! Contains the formatting logic for the [StContext] struct.

use super::StContext;
use crate::{
    constants::{
        BOTTOM_LEFT_BOX, COLORS, EMPTY_CIRCLE, FILLED_CIRCLE, HORIZONTAL_BOX, LEFT_FORK_BOX,
        VERTICAL_BOX,
    },
    errors::{StError, StResult},
    git::RepositoryExt,
    store::ConfigStore,
    tree::StackGraph,
};
use nu_ansi_term::Color;
use std::{
    collections::HashSet,
    fmt::{Display, Write},
};

impl<'a, S: ConfigStore> StContext<'a, S> {
    /// Gathers an in-order list of [DisplayBranch]es, containing the log-line and branch name.
    ///
    /// This function is particularly useful when creating prompts with [inquire::Select].
    pub fn display_branches(&self) -> StResult<Vec<DisplayBranch>> {
        let mut lines = Vec::new();
        self.render_tree(&mut lines)?;

        Ok(lines
            .into_iter()
            .map(|(branch_name, display_value)| DisplayBranch {
                display_value,
                branch_name,
            })
            .collect())
    }

    /// Prints the tree of tracked branches.
    pub fn print_tree(&self) -> StResult<()> {
        let mut buf = String::new();
        self.write_tree(&mut buf)?;
        print!("{}", buf);
        Ok(())
    }

    /// Writes the tree of tracked branches to the given [Write]r.
    pub fn write_tree<W: Write>(&self, w: &mut W) -> StResult<()> {
        let mut lines = Vec::new();
        self.render_tree(&mut lines)?;
        for (_, line) in lines {
            writeln!(w, "{}", line).map_err(|e| anyhow::anyhow!(e))?;
        }
        Ok(())
    }

    /// Renders every tracked stack, one `(branch, log-line)` pair per branch.
    fn render_tree(&self, lines: &mut Vec<(String, String)>) -> StResult<()> {
        let graph = self.graph()?;
        let checked_out = match self.repository.current_branch_name() {
            Ok(name) => Some(name),
            Err(StError::DetachedHead) => None,
            Err(e) => return Err(e),
        };

        let mut visited = HashSet::new();
        for root in graph.roots() {
            self.render_recursive(
                &graph,
                lines,
                &mut visited,
                checked_out.as_deref(),
                root,
                0,
                "",
                "",
                true,
            )?;
        }
        Ok(())
    }

    /// Renders `branch` and its children. Branches already rendered are skipped, which bounds the
    /// recursion on corrupted (cyclic) stacks.
    #[allow(clippy::too_many_arguments)]
    fn render_recursive(
        &self,
        graph: &StackGraph,
        lines: &mut Vec<(String, String)>,
        visited: &mut HashSet<String>,
        checked_out: Option<&str>,
        branch: &str,
        depth: usize,
        prefix: &str,
        connection: &str,
        is_parent_last_child: bool,
    ) -> StResult<()> {
        if !visited.insert(branch.to_string()) {
            return Ok(());
        }

        // Form the log-line for the current branch.
        let checked_out_icon = (Some(branch) == checked_out)
            .then_some(FILLED_CIRCLE)
            .unwrap_or(EMPTY_CIRCLE);
        let rendered_branch = COLORS[depth % COLORS.len()]
            .paint(format!("{}{} {}", connection, checked_out_icon, branch));
        let branch_metadata = {
            let needs_restack = match graph.parent(branch) {
                Some(_) if !self.repository.branch_exists(branch) => " (missing)",
                Some(parent) if !self.repository.branch_exists(parent) => " (parent missing)",
                Some(_) if self.needs_restack(branch)? => " (needs restack)",
                _ => "",
            };
            let pull_request = self
                .store
                .pr_number(branch)?
                .map(|n| format!(" {}", Color::Cyan.italic().paint(format!("#{}", n))))
                .unwrap_or_default();
            format!("{}{}", needs_restack, pull_request)
        };
        lines.push((
            branch.to_string(),
            format!("{}{}{}", prefix, rendered_branch, branch_metadata),
        ));

        // Render the children of the branch recursively.
        let mut children = graph.children(branch).iter().peekable();
        while let Some(child) = children.next() {
            let is_last_child = children.peek().is_none();
            let connection = format!(
                "{}{}",
                is_last_child
                    .then_some(BOTTOM_LEFT_BOX)
                    .unwrap_or(LEFT_FORK_BOX),
                HORIZONTAL_BOX
            );

            let prefix = if depth > 0 {
                let color = COLORS[depth % COLORS.len()];
                is_parent_last_child
                    .then(|| format!("{}  ", prefix))
                    .unwrap_or(format!(
                        "{}{} ",
                        prefix,
                        color.paint(VERTICAL_BOX.to_string())
                    ))
            } else {
                prefix.to_string()
            };

            self.render_recursive(
                graph,
                lines,
                visited,
                checked_out,
                child,
                depth + 1,
                prefix.as_str(),
                connection.as_str(),
                is_last_child,
            )?;
        }

        Ok(())
    }
}

/// A pair of a log-line and a branch name, which implements [Display].
#[derive(Debug)]
pub struct DisplayBranch {
    /// The log-line to display.
    pub(crate) display_value: String,
    /// The branch name corresponding to the log-line.
    pub(crate) branch_name: String,
}

impl Display for DisplayBranch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_value)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        ctx::StContext,
        store::{ConfigStore, MemoryStore},
        test_util::TestRepo,
    };
    use git2::BranchType;

    #[test]
    fn renders_every_tracked_branch_once() {
        let test = TestRepo::new();
        test.branch("a");
        test.branch("b");
        test.checkout("main");
        test.branch("c");

        let mut store = MemoryStore::default();
        store.set_parent("a", "main").unwrap();
        store.set_parent("b", "a").unwrap();
        store.set_parent("c", "main").unwrap();
        store.set_pr_number("b", 12).unwrap();
        let ctx = StContext::with_store(&test.repo, store);

        let branches = ctx.display_branches().unwrap();
        let names = branches
            .iter()
            .map(|b| b.branch_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["main", "a", "b", "c"]);
        assert!(branches[2].to_string().contains("#12"));
        assert!(branches[3].to_string().contains('●'));

        let mut buf = String::new();
        ctx.write_tree(&mut buf).unwrap();
        assert_eq!(buf.lines().count(), 4);
    }

    #[test]
    fn deleted_parents_are_annotated() {
        let test = TestRepo::new();
        test.branch("a");
        test.branch("b");
        test.repo
            .find_branch("a", BranchType::Local)
            .unwrap()
            .delete()
            .unwrap();

        let mut store = MemoryStore::default();
        store.set_parent("a", "main").unwrap();
        store.set_parent("b", "a").unwrap();
        let ctx = StContext::with_store(&test.repo, store);

        let branches = ctx.display_branches().unwrap();
        let names = branches
            .iter()
            .map(|b| b.branch_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["main", "a", "b"]);
        assert!(branches[1].to_string().contains("(missing)"));
        assert!(branches[2].to_string().contains("(parent missing)"));
    }
}
