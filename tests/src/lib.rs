//! End-to-end tests of the swarm engine and the user load test against the mock service.
