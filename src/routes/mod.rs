pub mod catchers;
pub mod health;
pub mod packages;
pub mod users;
pub mod versions;

use rocket::{catchers, routes};

pub fn get_routes() -> Vec<rocket::Route> {
    routes![
        health::health_check,
        // Users and sign-in
        users::sign_in,
        users::get_user,
        users::get_user_stars,
        users::get_own_stars,
        // Packages
        packages::create_package,
        packages::get_package,
        packages::delete_package,
        packages::rename_package,
        packages::get_stargazers,
        packages::star_package,
        packages::unstar_package,
        // Versions
        versions::add_version,
        versions::get_version,
        versions::remove_version,
        versions::download_tarball,
    ]
}

/// JSON error bodies for failures that never reach a handler
pub fn get_catchers() -> Vec<rocket::Catcher> {
    catchers![
        catchers::unauthorized,
        catchers::not_found,
        catchers::unprocessable,
        catchers::internal_error,
    ]
}
