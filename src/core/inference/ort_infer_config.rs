use super::OrtInfer;
use crate::core::config::{
    OrtExecutionProvider, OrtGraphOptimizationLevel as OG, OrtSessionConfig,
};
use ort::execution_providers::ExecutionProviderDispatch;
use ort::logging::LogLevel;
use ort::session::builder::{GraphOptimizationLevel as GOL, SessionBuilder};

impl OrtInfer {
    pub(super) fn apply_ort_config(
        mut builder: SessionBuilder,
        cfg: &OrtSessionConfig,
    ) -> Result<SessionBuilder, ort::Error> {
        if let Some(intra) = cfg.intra_threads {
            builder = builder.with_intra_threads(intra)?;
        }
        if let Some(inter) = cfg.inter_threads {
            builder = builder.with_inter_threads(inter)?;
        }
        if let Some(level) = cfg.optimization_level {
            let mapped = match level {
                OG::DisableAll => GOL::Disable,
                OG::Level1 => GOL::Level1,
                OG::Level2 => GOL::Level2,
                OG::Level3 => GOL::Level3,
            };
            builder = builder.with_optimization_level(mapped)?;
        }
        // 0=Verbose, 1=Info, 2=Warning, 3=Error, 4=Fatal
        let logging_level = match cfg.log_severity_level.unwrap_or(3) {
            0 => LogLevel::Verbose,
            1 => LogLevel::Info,
            2 => LogLevel::Warning,
            3 => LogLevel::Error,
            _ => LogLevel::Fatal,
        };
        builder = builder.with_log_level(logging_level)?;

        if let Some(eps) = &cfg.execution_providers {
            let providers = Self::build_execution_providers(eps)?;
            if !providers.is_empty() {
                builder = builder.with_execution_providers(providers)?;
            }
        }
        Ok(builder)
    }

    fn build_execution_providers(
        eps: &[OrtExecutionProvider],
    ) -> Result<Vec<ExecutionProviderDispatch>, ort::Error> {
        let mut providers = Vec::new();

        for ep in eps {
            match ep {
                OrtExecutionProvider::CPU => {
                    providers
                        .push(ort::execution_providers::CPUExecutionProvider::default().build());
                }
                #[cfg(feature = "cuda")]
                OrtExecutionProvider::CUDA {
                    device_id,
                    gpu_mem_limit,
                } => {
                    let mut cuda_provider =
                        ort::execution_providers::CUDAExecutionProvider::default();
                    if let Some(id) = device_id {
                        cuda_provider = cuda_provider.with_device_id(*id);
                    }
                    if let Some(limit) = gpu_mem_limit {
                        cuda_provider = cuda_provider.with_memory_limit(*limit);
                    }
                    providers.push(cuda_provider.build());
                }
                #[cfg(not(feature = "cuda"))]
                OrtExecutionProvider::CUDA { .. } => {
                    return Err(ort::Error::new(
                        "CUDA execution provider requested but cuda feature is not enabled",
                    ));
                }
            }
        }

        Ok(providers)
    }
}
