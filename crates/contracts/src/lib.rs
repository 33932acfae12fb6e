//! Типы, общие для всех потребителей сессии табов.
//!
//! Здесь только данные (serde), без поведения: хранилище сессии, реестр модулей
//! и UI-слой работают с одними и теми же структурами.

pub mod shared;
