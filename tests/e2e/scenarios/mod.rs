mod branching;
mod fixtures_and_helpers;
mod happy_path;
mod persistence;
mod status_and_staging;
