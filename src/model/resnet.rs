//! ResNet9 Architecture for Plant Disease Classification
//!
//! A compact residual network: two residual stages separated by strided
//! convolution blocks, followed by a max-pool/linear head. Built with the Burn
//! framework and used for inference only.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Square input resolution the network is built for.
///
/// Four 4x4 max-pools take 256 down to 1, so the head sees `8 * base_width`
/// features.
pub const INPUT_SIZE: usize = 256;

/// Name written to the model manifest
pub const ARCHITECTURE: &str = "resnet9";

/// Kernel and stride of every pooling layer
const POOL_SIZE: usize = 4;

/// Configuration for the ResNet9 classifier
#[derive(Config, Debug)]
pub struct ResNet9Config {
    /// Number of output classes
    #[config(default = "38")]
    pub num_classes: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Channels of the first block; later stages use 2x, 4x and 8x this
    #[config(default = "64")]
    pub base_width: usize,
}

impl ResNet9Config {
    /// Build the network on `device` with freshly initialized weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet9<B> {
        ResNet9::new(self, device)
    }
}

/// Conv2d (3x3, padding 1) -> BatchNorm -> ReLU, with an optional 4x4 max-pool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B>,
    activation: Relu,
    pool: Option<MaxPool2d>,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, with_pool: bool, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);

        let norm = BatchNormConfig::new(out_channels).init(device);

        let pool = with_pool.then(|| {
            MaxPool2dConfig::new([POOL_SIZE, POOL_SIZE])
                .with_strides([POOL_SIZE, POOL_SIZE])
                .init()
        });

        Self {
            conv,
            norm,
            activation: Relu::new(),
            pool,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.norm.forward(x);
        let x = self.activation.forward(x);

        match &self.pool {
            Some(pool) => pool.forward(x),
            None => x,
        }
    }
}

/// Two unpooled conv blocks whose output is added to the block input.
///
/// Both inner blocks keep `channels` and never pool, so the sum is always
/// shape-compatible.
#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
    first: ConvBlock<B>,
    second: ConvBlock<B>,
}

impl<B: Backend> ResidualBlock<B> {
    pub fn new(channels: usize, device: &B::Device) -> Self {
        Self {
            first: ConvBlock::new(channels, channels, false, device),
            second: ConvBlock::new(channels, channels, false, device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let out = self.first.forward(x.clone());
        let out = self.second.forward(out);
        out + x
    }
}

/// ResNet9 plant disease classifier
///
/// Layout for a 256x256 input and `w = base_width`:
/// - conv1: 3 -> w, 256x256
/// - conv2: w -> 2w, pooled to 64x64
/// - res1: 2w, 64x64
/// - conv3: 2w -> 4w, pooled to 16x16
/// - conv4: 4w -> 8w, pooled to 4x4
/// - res2: 8w, 4x4
/// - head: pool to 1x1, flatten, linear 8w -> num_classes
#[derive(Module, Debug)]
pub struct ResNet9<B: Backend> {
    conv1: ConvBlock<B>,
    conv2: ConvBlock<B>,
    res1: ResidualBlock<B>,
    conv3: ConvBlock<B>,
    conv4: ConvBlock<B>,
    res2: ResidualBlock<B>,
    head_pool: MaxPool2d,
    classifier: Linear<B>,
    num_classes: usize,
}

impl<B: Backend> ResNet9<B> {
    /// Create a new ResNet9 from configuration
    pub fn new(config: &ResNet9Config, device: &B::Device) -> Self {
        let w = config.base_width;

        Self {
            conv1: ConvBlock::new(config.in_channels, w, false, device),
            conv2: ConvBlock::new(w, w * 2, true, device),
            res1: ResidualBlock::new(w * 2, device),
            conv3: ConvBlock::new(w * 2, w * 4, true, device),
            conv4: ConvBlock::new(w * 4, w * 8, true, device),
            res2: ResidualBlock::new(w * 8, device),
            head_pool: MaxPool2dConfig::new([POOL_SIZE, POOL_SIZE])
                .with_strides([POOL_SIZE, POOL_SIZE])
                .init(),
            classifier: LinearConfig::new(w * 8, config.num_classes).init(device),
            num_classes: config.num_classes,
        }
    }

    /// Forward pass through the network
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, 256, 256], values in [0, 1]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.res1.forward(x);
        let x = self.conv3.forward(x);
        let x = self.conv4.forward(x);
        let x = self.res2.forward(x);

        let x = self.head_pool.forward(x);
        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);

        self.classifier.forward(x)
    }

    /// Get the number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

#[cfg(all(test, feature = "ndarray"))]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    fn narrow_model() -> ResNet9<TestBackend> {
        let device = Default::default();
        ResNet9Config::new().with_base_width(4).init(&device)
    }

    #[test]
    fn test_config_defaults() {
        let config = ResNet9Config::new();
        assert_eq!(config.num_classes, 38);
        assert_eq!(config.in_channels, 3);
        assert_eq!(config.base_width, 64);
    }

    #[test]
    fn test_output_shape() {
        let device = Default::default();
        let model = narrow_model();

        let input = Tensor::<TestBackend, 4>::zeros([2, 3, INPUT_SIZE, INPUT_SIZE], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 38]);
        assert_eq!(model.num_classes(), 38);
    }

    #[test]
    fn test_zeros_input_gives_finite_logits() {
        let device = Default::default();
        let model = narrow_model();

        let input = Tensor::<TestBackend, 4>::zeros([1, 3, INPUT_SIZE, INPUT_SIZE], &device);
        let logits: Vec<f32> = model.forward(input).into_data().to_vec().unwrap();

        assert_eq!(logits.len(), 38);
        assert!(logits.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_residual_block_preserves_shape() {
        let device = Default::default();
        let block = ResidualBlock::<TestBackend>::new(8, &device);

        let input = Tensor::<TestBackend, 4>::ones([1, 8, 16, 16], &device);
        let output = block.forward(input);

        assert_eq!(output.dims(), [1, 8, 16, 16]);
    }

    #[test]
    fn test_pooled_conv_block_downsamples_by_four() {
        let device = Default::default();
        let block = ConvBlock::<TestBackend>::new(3, 8, true, &device);

        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 64, 64], &device);
        assert_eq!(block.forward(input).dims(), [1, 8, 16, 16]);
    }
}
