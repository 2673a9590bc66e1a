//! Store backends implementing `sparsedao_core::storage::TableProvider`.

pub mod memory;
