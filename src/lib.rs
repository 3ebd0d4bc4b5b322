//! Procurement price dashboard over the Banco de Preços em Saúde dataset:
//! load once, narrow by state / municipality / supplier / year / product,
//! summarise, export.

pub mod config;
pub mod data;
pub mod format;
pub mod state;
