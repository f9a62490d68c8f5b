use std::env;
use log::error;
use ble_device_list::run;
use ble_device_list::error::AppRunError;

fn main() -> Result<(), AppRunError> {
    let args = env::args();

    match run(args) {
        Err(err) => {
            error!("Unexpected error: {}", err);
            Err(err)
        },
        Ok(_) => Ok(()),
    }
}
