#[tokio::main]
async fn main() {
    asistencia::start_server().await;
}
