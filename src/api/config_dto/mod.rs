pub mod cluster_config_dto;
