use log::error;

#[tokio::main]
async fn main()
{   env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).init();

    let result = match geollm::GeoLlmConfig::load()
    {   Ok(config) => geollm::server::serve(config).await
      , Err(e) => Err(e)
    };

    if let Err(e) = result
    {   error!("geollm stopped: {}", e);
        std::process::exit(1);
    }
}
