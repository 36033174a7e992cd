/// BERT for Token Classification (such as named entity recognition or slot filling)
pub mod token_classification;
