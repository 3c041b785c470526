mod test_bracket;
mod test_legacy;
mod test_materialize;
