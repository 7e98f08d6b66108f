//! Contract tests for the object_model public API

mod test_api_contract;
