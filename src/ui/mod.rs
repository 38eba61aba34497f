//! UI components for Tempo Docs

pub mod editor;
pub mod field_view;
pub mod notifications;
pub mod preview;
pub mod sidebar;
