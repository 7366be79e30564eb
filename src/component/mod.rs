//! Component system
//!
//! A component is a file holding an optional `<template>`, `<style>` and
//! `<script>`. Documents pull components in with `<import>` and instantiate
//! them by tag name:
//!
//! ```text
//! <!-- card.htmlp -->
//! <template args="title ?subtitle">
//!     <div class="card"><h1>$title</h1><p>$subtitle</p>$children</div>
//! </template>
//!
//! <!-- index.htmlp -->
//! <import path="card.htmlp">
//! <card title="Hi">body</card>
//! ```
//!
//! Resolution happens in two passes. [`ImportResolver`] loads every imported
//! file (recursively, through a shared [`ComponentRegistry`]) and
//! [`expand_components`] then replaces usage sites with template copies.

mod expander;
mod imports;
mod registry;
mod uniques;

pub use expander::{expand_components, BoundArg, CHILDREN_SLOT};
pub use imports::{ImportResolver, Imports, Route};
pub use registry::{ArgDefinition, ComponentDefinition, ComponentRegistry};
pub use uniques::{UniqueCounter, UniquesPerComponent};
