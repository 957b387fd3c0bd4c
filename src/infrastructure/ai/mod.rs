pub mod kie_client;
