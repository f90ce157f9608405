use log::error;
use rocket::launch;

#[launch]
fn rocket() -> _ {
    // Initialize logging
    env_logger::init();

    match hangar::create_rocket() {
        Ok(rocket) => rocket,
        Err(e) => {
            error!("Failed to start registry: {e}");
            std::process::exit(1);
        }
    }
}
