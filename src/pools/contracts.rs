use alloy_sol_types::sol;

sol! {
    interface IERC20 {
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
    }

    /// Gamma style managed liquidity vault. The vault contract is itself the
    /// LP token.
    interface IHypervisor {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getTotalAmounts() external view returns (uint256 total0, uint256 total1);
    }

    interface IUniswapV2Pair {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }
}
