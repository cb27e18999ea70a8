mod common;
mod invocation;
