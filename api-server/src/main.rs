#[rocket::launch]
fn rocket() -> _ {
    easypay_api::rocket()
}
