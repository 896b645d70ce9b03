mod property_tests;
mod test_helpers;
