//! In-memory project list and selection
//!
//! Every operation here is a pure state transition: nothing touches storage
//! or the filesystem. Operations that change a project return it so the
//! caller can hand it to the persistence layer.

use super::model::{FieldKind, Project, Size, Step, StepField};
use super::serialization::ImportedProject;

/// All loaded projects plus the current selection
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    projects: Vec<Project>,
    selected: Option<String>,
}

/// Result of loading stored projects into a workspace
#[derive(Debug)]
pub struct Loaded {
    pub workspace: Workspace,
    /// Set when the store was empty and the guide project was seeded
    pub seeded: Option<Project>,
}

impl Workspace {
    /// Build a workspace from stored projects, seeding the guide project
    /// when there are none
    pub fn from_stored(projects: Vec<Project>) -> Loaded {
        if projects.is_empty() {
            let guide = Project::getting_started();
            let workspace = Self {
                selected: Some(guide.id.clone()),
                projects: vec![guide.clone()],
            };
            return Loaded {
                workspace,
                seeded: Some(guide),
            };
        }

        let selected = projects.first().map(|p| p.id.clone());
        Loaded {
            workspace: Self { projects, selected },
            seeded: None,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.selected.as_deref().and_then(|id| self.project(id))
    }

    #[allow(dead_code)]
    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected.as_deref()?;
        self.projects.iter().position(|p| p.id == id)
    }

    /// Select a project. Unknown ids are ignored.
    pub fn select(&mut self, id: &str) -> bool {
        if self.project(id).is_some() {
            self.selected = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Projects whose name contains `query`, ignoring case
    pub fn filter(&self, query: &str) -> Vec<&Project> {
        let query = query.to_lowercase();
        self.projects
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&query))
            .collect()
    }

    fn push_selected(&mut self, project: Project) -> &Project {
        self.selected = Some(project.id.clone());
        self.projects.push(project);
        // Just pushed, so the list is non-empty.
        &self.projects[self.projects.len() - 1]
    }

    /// Append a blank project and select it
    pub fn create_project(&mut self) -> &Project {
        self.push_selected(Project::new_blank())
    }

    /// Append an imported project under a fresh id and select it
    pub fn import_project(&mut self, imported: ImportedProject) -> &Project {
        self.push_selected(imported.into_project())
    }

    /// Remove a project.
    ///
    /// When the selected project is removed, the selection moves to the
    /// project now at the same position (or the new last one), and is
    /// cleared when no projects remain.
    pub fn delete_project(&mut self, id: &str) -> Option<Project> {
        let index = self.projects.iter().position(|p| p.id == id)?;
        let removed = self.projects.remove(index);

        if self.selected.as_deref() == Some(id) {
            self.selected = if self.projects.is_empty() {
                None
            } else {
                let next = index.min(self.projects.len() - 1);
                Some(self.projects[next].id.clone())
            };
        }

        Some(removed)
    }

    /// Replace every project with the guide project
    pub fn reset(&mut self) -> &Project {
        self.projects.clear();
        self.push_selected(Project::getting_started())
    }

    pub fn rename_project(&mut self, id: &str, name: &str) -> Option<&Project> {
        let project = self.project_mut(id)?;
        project.name = name.to_string();
        Some(&*project)
    }

    #[allow(dead_code)]
    pub fn set_steps(&mut self, id: &str, steps: Vec<Step>) -> Option<&Project> {
        let project = self.project_mut(id)?;
        project.steps = steps;
        Some(&*project)
    }

    /// Append a blank slide
    pub fn add_step(&mut self, id: &str) -> Option<&Project> {
        let project = self.project_mut(id)?;
        project.steps.push(Step::blank());
        Some(&*project)
    }

    pub fn delete_step(&mut self, id: &str, step: usize) -> Option<&Project> {
        let project = self.project_mut(id)?;
        if step >= project.steps.len() {
            return None;
        }
        project.steps.remove(step);
        Some(&*project)
    }

    /// Move the step at `from` so it ends up at index `to`.
    ///
    /// Every other step keeps its relative order. `to` is clamped to the
    /// last position.
    pub fn move_step(&mut self, id: &str, from: usize, to: usize) -> Option<&Project> {
        let project = self.project_mut(id)?;
        if from >= project.steps.len() {
            return None;
        }
        let step = project.steps.remove(from);
        let to = to.min(project.steps.len());
        project.steps.insert(to, step);
        Some(&*project)
    }

    fn step_mut(&mut self, id: &str, step: usize) -> Option<&mut Step> {
        self.project_mut(id)?.steps.get_mut(step)
    }

    /// Append a field to a step
    pub fn add_field(&mut self, id: &str, step: usize, kind: FieldKind) -> Option<&Project> {
        self.step_mut(id, step)?.fields.push(StepField::new(kind));
        self.project(id)
    }

    /// Replace a field's content and attributes, keeping its id
    #[allow(dead_code)]
    pub fn update_field(
        &mut self,
        id: &str,
        step: usize,
        field: usize,
        kind: FieldKind,
    ) -> Option<&Project> {
        self.step_mut(id, step)?.fields.get_mut(field)?.kind = kind;
        self.project(id)
    }

    pub fn set_field_content(
        &mut self,
        id: &str,
        step: usize,
        field: usize,
        content: String,
    ) -> Option<&Project> {
        self.step_mut(id, step)?
            .fields
            .get_mut(field)?
            .kind
            .set_content(content);
        self.project(id)
    }

    pub fn set_field_size(
        &mut self,
        id: &str,
        step: usize,
        field: usize,
        size: Size,
    ) -> Option<&Project> {
        let field = self.step_mut(id, step)?.fields.get_mut(field)?;
        field.kind.explicit_size()?;
        field.kind.set_size(size);
        self.project(id)
    }

    pub fn delete_field(&mut self, id: &str, step: usize, field_id: &str) -> Option<&Project> {
        let step = self.step_mut(id, step)?;
        let index = step.field_index(field_id)?;
        step.fields.remove(index);
        self.project(id)
    }

    /// Switch an embedded frame to a link card or back
    pub fn toggle_embed_mode(&mut self, id: &str, step: usize, field: usize) -> Option<&Project> {
        let field = self.step_mut(id, step)?.fields.get_mut(field)?;
        field.kind = field.kind.toggle_embed_mode()?;
        self.project(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: format!("Project {id}"),
            steps: Vec::new(),
        }
    }

    fn workspace_of(ids: &[&str]) -> Workspace {
        Workspace::from_stored(ids.iter().map(|id| named(id)).collect()).workspace
    }

    fn numbered_steps(n: usize) -> Vec<Step> {
        (0..n)
            .map(|i| Step {
                id: i.to_string(),
                fields: vec![StepField::with_id(format!("f{i}"), FieldKind::title(format!("Step {i}")))],
            })
            .collect()
    }

    fn step_ids(project: &Project) -> Vec<&str> {
        project.steps.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_empty_store_seeds_guide() {
        let loaded = Workspace::from_stored(Vec::new());
        let seeded = loaded.seeded.expect("guide project seeded");
        assert_eq!(seeded.name, "Getting Started Guide");
        assert_eq!(seeded.steps.len(), 5);
        assert_eq!(loaded.workspace.selected_id(), Some("1"));
    }

    #[test]
    fn test_stored_projects_select_first() {
        let loaded = Workspace::from_stored(vec![named("a"), named("b")]);
        assert!(loaded.seeded.is_none());
        assert_eq!(loaded.workspace.selected_id(), Some("a"));
    }

    #[test]
    fn test_create_selects_new_project() {
        let mut ws = workspace_of(&["a"]);
        let id = ws.create_project().id.clone();
        assert_eq!(ws.selected_id(), Some(id.as_str()));
        assert_eq!(ws.projects().len(), 2);
        assert_eq!(ws.selected_project().unwrap().steps[0].label(), "Getting Started");
    }

    #[test]
    fn test_delete_selected_repairs_selection() {
        // Middle: the next project slides into the same index.
        let mut ws = workspace_of(&["a", "b", "c"]);
        ws.select("b");
        ws.delete_project("b").unwrap();
        assert_eq!(ws.selected_id(), Some("c"));

        // Last: selection falls back to the new last project (index N-2).
        let mut ws = workspace_of(&["a", "b", "c"]);
        ws.select("c");
        ws.delete_project("c");
        assert_eq!(ws.selected_id(), Some("b"));

        // First.
        let mut ws = workspace_of(&["a", "b", "c"]);
        ws.delete_project("a");
        assert_eq!(ws.selected_id(), Some("b"));
    }

    #[test]
    fn test_delete_selection_index_rule() {
        for n in 2..6 {
            for deleted in 0..n {
                let ids: Vec<String> = (0..n).map(|i| i.to_string()).collect();
                let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
                let mut ws = workspace_of(&refs);
                ws.select(&ids[deleted]);
                ws.delete_project(&ids[deleted]);
                assert_eq!(ws.selected_index(), Some(deleted.min(n - 2)));
            }
        }
    }

    #[test]
    fn test_delete_last_project_clears_selection() {
        let mut ws = workspace_of(&["only"]);
        ws.delete_project("only");
        assert!(ws.selected_id().is_none());
        assert!(ws.selected_project().is_none());
        assert!(ws.projects().is_empty());
    }

    #[test]
    fn test_delete_unselected_keeps_selection() {
        let mut ws = workspace_of(&["a", "b", "c"]);
        ws.select("c");
        ws.delete_project("a");
        assert_eq!(ws.selected_id(), Some("c"));
        assert!(ws.delete_project("missing").is_none());
    }

    #[test]
    fn test_move_step_relocates_one_element() {
        for from in 0..5 {
            for to in 0..5 {
                let mut ws = workspace_of(&["p"]);
                ws.set_steps("p", numbered_steps(5));
                let moved = ws.move_step("p", from, to).unwrap();

                let mut expected: Vec<String> = (0..5).map(|i| i.to_string()).collect();
                let item = expected.remove(from);
                expected.insert(to, item);
                assert_eq!(step_ids(moved), expected);
            }
        }
    }

    #[test]
    fn test_move_step_out_of_range() {
        let mut ws = workspace_of(&["p"]);
        ws.set_steps("p", numbered_steps(3));
        assert!(ws.move_step("p", 3, 0).is_none());
        let moved = ws.move_step("p", 0, 99).unwrap();
        assert_eq!(step_ids(moved), vec!["1", "2", "0"]);
    }

    #[test]
    fn test_step_and_field_edits() {
        let mut ws = workspace_of(&["p"]);
        ws.add_step("p").unwrap();
        ws.add_field("p", 0, FieldKind::link_preview("https://example.com"))
            .unwrap();

        let project = ws.set_field_content("p", 0, 0, "Intro".into()).unwrap();
        assert_eq!(project.steps[0].label(), "Intro");

        let project = ws
            .set_field_size("p", 0, 2, Size::new(500.0, 120.0))
            .unwrap();
        assert_eq!(project.steps[0].fields[2].kind.size(), Some(Size::new(500.0, 120.0)));
        assert!(ws.set_field_size("p", 0, 0, Size::new(1.0, 1.0)).is_none());

        let project = ws.toggle_embed_mode("p", 0, 2).unwrap();
        assert_eq!(project.steps[0].fields[2].kind.type_name(), "iframe");

        let field_id = ws.project("p").unwrap().steps[0].fields[1].id.clone();
        let project = ws.delete_field("p", 0, &field_id).unwrap();
        assert_eq!(project.steps[0].fields.len(), 2);

        ws.update_field("p", 0, 0, FieldKind::text("now text")).unwrap();
        assert_eq!(ws.project("p").unwrap().steps[0].fields[0].kind.type_name(), "text");

        assert!(ws.delete_step("p", 5).is_none());
        assert!(ws.delete_step("p", 0).unwrap().steps.is_empty());
    }

    #[test]
    fn test_rename_and_filter() {
        let mut ws = workspace_of(&["a", "b"]);
        ws.rename_project("a", "Garden Irrigation").unwrap();
        let hits = ws.filter("irrig");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
        assert_eq!(ws.filter("").len(), 2);
        assert!(ws.rename_project("zzz", "x").is_none());
    }

    #[test]
    fn test_import_gets_fresh_id_and_selection() {
        let mut ws = workspace_of(&["a"]);
        let imported = ImportedProject {
            name: "Imported".into(),
            steps: numbered_steps(2),
        };
        let project = ws.import_project(imported);
        assert_ne!(project.id, "a");
        let id = project.id.clone();
        assert_eq!(ws.selected_id(), Some(id.as_str()));
    }

    #[test]
    fn test_reset_restores_guide() {
        let mut ws = workspace_of(&["a", "b"]);
        ws.reset();
        assert_eq!(ws.projects().len(), 1);
        assert_eq!(ws.selected_id(), Some("1"));
    }
}
