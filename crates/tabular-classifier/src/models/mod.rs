pub mod logistic;
pub mod one_vs_rest;

pub mod classifier_trait;
pub mod factory;
