//! Solidity interfaces of the deployed contracts.
//!
//! Signatures are dictated by the deployed bytecode and must not change.

use alloy::sol;

// ERC-8004 Identity Registry
sol! {
    interface IIdentityRegistry {
        struct MetadataEntry {
            string key;
            bytes value;
        }

        function register(string tokenURI, MetadataEntry[] metadata) external returns (uint256 agentId);
        function getMetadata(uint256 agentId, string key) external view returns (bytes value);
        function setMetadata(uint256 agentId, string key, bytes value) external;
        function tokenURI(uint256 tokenId) external view returns (string uri);
        function setAgentUri(uint256 agentId, string newUri) external;

        #[derive(Debug, PartialEq, Eq)]
        event Registered(uint256 indexed agentId, string tokenURI, address indexed owner);
    }
}

// ERC-8004 Validation Registry
sol! {
    interface IValidationRegistry {
        function validationRequest(
            address validatorAddress,
            uint256 agentId,
            string requestUri,
            bytes32 requestHash
        ) external;

        function validationResponse(
            bytes32 requestHash,
            uint8 response,
            string responseUri,
            bytes32 responseHash,
            bytes32 tag
        ) external;

        function getValidationStatus(bytes32 requestHash) external view returns (
            address validatorAddress,
            uint256 agentId,
            uint8 response,
            bytes32 responseHash,
            bytes32 tag,
            uint256 lastUpdate
        );
    }
}

// Staking validator
sol! {
    interface IStakingValidator {
        function stake(uint256 amount) external;
        function requestUnstake() external;
        function unstake() external;

        function submitValidation(
            bytes32 requestHash,
            uint8 response,
            string responseUri,
            bytes32 responseHash,
            bytes32 tag
        ) external;

        function claimRewards() external;

        function getValidatorInfo(address validator) external view returns (
            uint256 stake,
            bool active,
            uint256 rewards,
            uint256 validations
        );

        function getStats() external view returns (
            uint256 _totalStaked,
            uint256 _totalRewards,
            uint256 _totalSlashed
        );
    }
}

// Bonded stake token (ERC-20 subset plus test faucet)
sol! {
    interface IStakeToken {
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function mint(address to, uint256 amount) external;
    }
}
