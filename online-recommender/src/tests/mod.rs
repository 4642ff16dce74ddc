pub(crate) mod stubs;
