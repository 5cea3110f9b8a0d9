// Health module: liveness/readiness probes for the deployment environment

pub mod controllers;
