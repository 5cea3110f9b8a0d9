pub mod period_controller;
