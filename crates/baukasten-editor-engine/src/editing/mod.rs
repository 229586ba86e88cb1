/*!
 * # Editing Core Module
 *
 * The editing core of the Baukasten rich text input: a plain-text editor
 * that turns trigger characters into atomic mentions and highlights pattern
 * matches with decorator wrappers.
 *
 * ## Architecture Overview
 *
 * ### 1. Tree as Source of Truth
 * - Content is an arena [`Tree`](crate::model::Tree) of text, line breaks,
 *   mentions and decorator wrappers
 * - Segments are only ever derived from the tree, never the other way round
 *
 * ### 2. Flat Offsets
 * - Carets are carried as **flat offsets** so they survive the tree being
 *   rebuilt by decorator passes
 * - A mention is one indivisible step; line breaks and block boundaries count one
 *
 * ### 3. Command-Based Editing
 * - Every edit is a **Command** (`Cmd`) or a key press (`KeyInput`)
 * - Each mutation runs the same pipeline: strip decorators, edit, serialize
 *   and emit, detect triggers, reapply decorators
 * - The result of every call is a **Patch** with events, selection and version
 *
 * ### 4. Read API: Snapshots
 * - Hosts paint from a [`Snapshot`]: styled lines, caret, placeholder and
 *   the suggestion menu
 *
 * ## Module Structure
 *
 * - **`offsets`**: flat offset ↔ tree position mapping and caret stops
 * - **`triggers`**: trigger definitions, suggestions and trigger detection
 * - **`decorators`**: decorator rules, `apply()` and `strip()`
 * - **`suggestions`**: the suggestion menu state machine
 * - **`mutate`**: offset-addressed insert/delete on the tree
 * - **`commands`**: `Cmd` and key input
 * - **`editor`**: the `Editor` facade running the pipeline
 * - **`patch`**: events and selection returned to the host
 * - **`snapshot`**: render view for hosts
 *
 * ## Usage Pattern
 *
 * ```rust
 * use baukasten_editor_engine::editing::*;
 *
 * let mut editor = Editor::new(EditorOptions {
 *     triggers: vec![TriggerDefinition::new('@', vec![Suggestion::new("Alice")])],
 *     ..Default::default()
 * });
 * editor.focus();
 * for c in "Hi @Al".chars() {
 *     editor.handle_key(KeyInput::new(Key::Char(c)));
 * }
 * let patch = editor.handle_key(KeyInput::new(Key::Enter));
 * assert_eq!(patch.change().map(|c| c.text.as_str()), Some("Hi @Alice "));
 * ```
 */

pub mod commands;
pub mod decorators;
pub mod editor;
pub mod mutate;
pub mod offsets;
pub mod patch;
pub mod snapshot;
pub mod suggestions;
pub mod triggers;

pub use commands::{Cmd, Key, KeyInput, Modifiers};
pub use decorators::{DecoratorRule, MatchRange};
pub use editor::{Editor, EditorOptions, MENTION_SPACER};
pub use offsets::{Position, Selection, get_offset, restore_offset};
pub use patch::{ContentChange, EditorEvent, FlatSelection, Patch};
pub use snapshot::{CaretPoint, MenuItem, MenuView, RenderLine, RenderRun, RunKind, Snapshot};
pub use suggestions::{ActiveTrigger, MenuState, SuggestionMenu};
pub use triggers::{Suggestion, TriggerDefinition, TriggerMatch};
