//! Output-file writers: solution file, temperature schedule, Gnuplot
//! floorplans, HotSpot inputs, map dumps and the run summary.

pub mod gnuplot;
pub mod hotspot;
pub mod maps;
pub mod schedule;
pub mod solution;
pub mod summary;

pub use gnuplot::write_floorplan_scripts;
pub use hotspot::write_hotspot_files;
pub use maps::write_maps;
pub use schedule::write_temp_schedule;
pub use solution::{solution_string, write_solution_file};
pub use summary::RunSummary;
