//! tabular-classifier: logistic-regression scoring over labeled tables.
//!
//! This crate encodes train/test/validation tables (categorical columns via
//! label encoders), fits a logistic-regression model on the train split and
//! reports accuracy, precision/recall, a confusion matrix and per-class ROC
//! curves with AUC.
//!
//! The entry point is `classifier::ClassifierSession`; the remaining modules
//! are small and testable on their own.
pub mod classifier;
pub mod config;
pub mod data_handling;
pub mod error;
pub mod models;
pub mod preprocessing;
pub mod stats;
