use std::process::ExitCode;

use formcoach_lib::CoachError;

fn main() -> ExitCode {
    match formcoach_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<CoachError>() {
                Some(CoachError::ResourceUnavailable { resource, path, .. }) => {
                    eprintln!("error: {resource} not found at {}", path.display());
                    eprintln!("caused by: {err:#}");
                }
                _ => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
